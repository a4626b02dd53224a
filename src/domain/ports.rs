use crate::config::rules::ExtractionRules;
use crate::domain::model::{DateRange, ExtractionResult, Row};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 抽取引擎讀取的抽象列來源 (試算表載入元件實作)
pub trait RowSource {
    /// 依原始順序列出所有列
    fn rows(&self) -> impl Iterator<Item = &Row>;

    /// 讀取儲存格的實際值；若落在合併範圍內，回傳左上角錨點的值
    fn resolve_merged(&self, row_index: usize, col_index: usize) -> Option<&str>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub const DEFAULT_BUNDLE_FILENAME: &str = "extraction.zip";

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn merged_ranges(&self) -> &[String];
    fn bundle_output(&self) -> bool;
    fn bundle_filename(&self) -> &str {
        DEFAULT_BUNDLE_FILENAME
    }
    fn rules(&self) -> &ExtractionRules;
    /// 入住/退房日期；有設定時另外輸出 stay.csv
    fn stay(&self) -> Option<DateRange> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Sheet: RowSource + Send;

    async fn extract(&self) -> Result<Self::Sheet>;
    async fn transform(&self, sheet: Self::Sheet) -> Result<ExtractionResult>;
    async fn load(&self, result: ExtractionResult) -> Result<String>;
}
