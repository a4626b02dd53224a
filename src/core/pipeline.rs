use crate::adapters::sheet::MemorySheet;
use crate::core::merged::MergedRange;
use crate::core::{extractor, report};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::ExtractionResult;
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const JSON_FILENAME: &str = "extraction.json";
pub const ROOMS_FILENAME: &str = "rooms.csv";
pub const PERIODS_FILENAME: &str = "periods.csv";
pub const EXTRAS_FILENAME: &str = "extras.csv";
pub const ISSUES_FILENAME: &str = "issues.csv";
pub const RATES_FILENAME: &str = "rates.csv";
pub const STAY_FILENAME: &str = "stay.csv";

/// 讀取試算表匯出檔 → 抽取飯店模型 → 輸出 JSON/CSV (可選 ZIP)
///
/// `source` 讀輸入檔 (`input_path` 相對於它)，`storage` 寫輸出檔。
pub struct RateSheetPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) source: S,
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> RateSheetPipeline<S, C> {
    pub fn new(source: S, storage: S, config: C) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 依輸出格式產生 (檔名, 內容) 清單
    fn render_outputs(&self, result: &ExtractionResult) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();

        for format in self.config.output_formats() {
            match format.as_str() {
                "json" => {
                    let json = serde_json::to_vec_pretty(result)?;
                    files.push((JSON_FILENAME, json));
                }
                "csv" => {
                    files.push((ROOMS_FILENAME, report::rooms_csv(result)?.into_bytes()));
                    files.push((RATES_FILENAME, report::rates_csv(result)?.into_bytes()));
                    files.push((PERIODS_FILENAME, report::periods_csv(result)?.into_bytes()));
                    files.push((EXTRAS_FILENAME, report::extras_csv(result)?.into_bytes()));
                    files.push((ISSUES_FILENAME, report::issues_csv(result)?.into_bytes()));
                    if let Some(stay) = self.config.stay() {
                        tracing::debug!("Pricing stay {} - {}", stay.start, stay.end);
                        files.push((STAY_FILENAME, report::stay_csv(result, stay)?.into_bytes()));
                    }
                }
                other => {
                    // 設定驗證時已擋下，這裡只記錄
                    tracing::warn!("Skipping unsupported output format: {}", other);
                }
            }
        }

        Ok(files)
    }

    fn bundle(files: &[(&'static str, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for (name, data) in files {
            zip.start_file(*name, options)?;
            zip.write_all(data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RateSheetPipeline<S, C> {
    type Sheet = MemorySheet;

    async fn extract(&self) -> Result<MemorySheet> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading rate sheet from: {}", input_path);

        let bytes = self.source.read_file(input_path).await?;
        let delimiter = MemorySheet::delimiter_for(input_path);
        let mut sheet = MemorySheet::from_delimited(bytes.as_slice(), delimiter)?;

        for range in self.config.merged_ranges() {
            sheet.add_merged_range(MergedRange::parse_a1(range)?);
        }
        tracing::debug!(
            "Loaded {} rows with {} merged ranges",
            sheet.len(),
            self.config.merged_ranges().len()
        );

        Ok(sheet)
    }

    async fn transform(&self, sheet: MemorySheet) -> Result<ExtractionResult> {
        let rules = self.config.rules();
        Ok(extractor::extract(&sheet, rules))
    }

    async fn load(&self, result: ExtractionResult) -> Result<String> {
        let files = self.render_outputs(&result)?;
        let output_root = Path::new(self.config.output_path());

        if self.config.bundle_output() {
            let filename = self.config.bundle_filename();
            tracing::debug!("Creating ZIP file with {} files", files.len());
            let zip_data = Self::bundle(&files)?;

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(filename, &zip_data).await?;
            return Ok(output_root.join(filename).to_string_lossy().to_string());
        }

        for (name, data) in &files {
            self.storage.write_file(name, data).await?;
        }
        tracing::debug!("Wrote {} output files", files.len());

        Ok(output_root.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::ExtractionRules;
    use crate::domain::model::DateRange;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .unwrap()
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }

        fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }

        fn names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.get(path).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()).into()
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        input_path: String,
        output_formats: Vec<String>,
        merged_ranges: Vec<String>,
        bundle: bool,
        stay: Option<DateRange>,
        rules: ExtractionRules,
    }

    impl TestConfig {
        fn new(input_path: &str) -> Self {
            Self {
                input_path: input_path.to_string(),
                output_formats: vec!["json".to_string(), "csv".to_string()],
                merged_ranges: Vec::new(),
                bundle: false,
                stay: None,
                rules: ExtractionRules::default(),
            }
        }
    }

    impl ConfigProvider for TestConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn merged_ranges(&self) -> &[String] {
            &self.merged_ranges
        }

        fn bundle_output(&self) -> bool {
            self.bundle
        }

        fn rules(&self) -> &ExtractionRules {
            &self.rules
        }

        fn stay(&self) -> Option<DateRange> {
            self.stay
        }
    }

    const SHEET: &str = "\
Hotel Sol (A),,,
,High Season,,
,(1May25 - 30Sep25),,
GARDEN VIEW,,,
dbl garden,,150,
sgl garden,,,
,,,
Breakfast,,12,
";

    const INPUT: &str = "rates/sol.csv";

    fn pipeline_with(
        storage: MockStorage,
        config: TestConfig,
    ) -> RateSheetPipeline<MockStorage, TestConfig> {
        RateSheetPipeline::new(MockStorage::with_file(INPUT, SHEET), storage, config)
    }

    #[tokio::test]
    async fn test_extract_applies_merged_ranges() {
        let mut config = TestConfig::new(INPUT);
        config.merged_ranges = vec!["C5:C6".to_string()];
        let pipeline = pipeline_with(MockStorage::default(), config);

        let sheet = pipeline.extract().await.unwrap();
        let result = pipeline.transform(sheet).await.unwrap();

        let hotel = result.hotel("Hotel Sol (A)").unwrap();
        let room_type = hotel.room_type("GARDEN VIEW").unwrap();
        assert_eq!(room_type.rooms.len(), 2);
        assert_eq!(
            room_type.find_room("sgl garden").unwrap().price.as_numeric(),
            Some(150.0)
        );
    }

    #[tokio::test]
    async fn test_extract_reads_input_through_source_storage() {
        // 輸出端有同名檔案也不會被讀到
        let pipeline = RateSheetPipeline::new(
            MockStorage::with_file("other.csv", SHEET),
            MockStorage::with_file(INPUT, SHEET),
            TestConfig::new(INPUT),
        );

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, crate::utils::error::RateSheetError::IoError(_)));
    }

    #[tokio::test]
    async fn test_extract_reads_tsv_by_extension() {
        let tsv = SHEET.replace(',', "\t");
        let pipeline = RateSheetPipeline::new(
            MockStorage::with_file("rates/sol.tsv", &tsv),
            MockStorage::default(),
            TestConfig::new("rates/sol.tsv"),
        );

        let sheet = pipeline.extract().await.unwrap();
        let result = pipeline.transform(sheet).await.unwrap();
        assert_eq!(result.stats().rooms, 1);
        assert_eq!(result.stats().extras, 1);
    }

    #[tokio::test]
    async fn test_extract_rejects_bad_merged_range() {
        let mut config = TestConfig::new(INPUT);
        config.merged_ranges = vec!["nope".to_string()];
        let pipeline = pipeline_with(MockStorage::default(), config);

        assert!(pipeline.extract().await.is_err());
    }

    #[tokio::test]
    async fn test_load_writes_each_file() {
        let storage = MockStorage::default();
        let pipeline = pipeline_with(storage.clone(), TestConfig::new(INPUT));

        let sheet = pipeline.extract().await.unwrap();
        let result = pipeline.transform(sheet).await.unwrap();
        let output = pipeline.load(result).await.unwrap();

        assert_eq!(output, "out");
        assert_eq!(
            storage.names(),
            vec![
                "extraction.json",
                "extras.csv",
                "issues.csv",
                "periods.csv",
                "rates.csv",
                "rooms.csv"
            ]
        );

        let json: serde_json::Value =
            serde_json::from_slice(&storage.get(JSON_FILENAME).unwrap()).unwrap();
        assert_eq!(json["hotels"][0]["name"], "Hotel Sol (A)");
        assert_eq!(json["hotels"][0]["extras"][0]["name"], "Breakfast");
    }

    #[tokio::test]
    async fn test_load_bundles_into_zip() {
        let storage = MockStorage::default();
        let mut config = TestConfig::new(INPUT);
        config.output_formats = vec!["csv".to_string()];
        config.bundle = true;
        let pipeline = pipeline_with(storage.clone(), config);

        let sheet = pipeline.extract().await.unwrap();
        let result = pipeline.transform(sheet).await.unwrap();
        let output = pipeline.load(result).await.unwrap();

        assert!(output.ends_with("extraction.zip"));
        assert_eq!(storage.names(), vec!["extraction.zip"]);

        let zip_data = storage.get("extraction.zip").unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 5);

        let mut rooms = String::new();
        archive
            .by_name(ROOMS_FILENAME)
            .unwrap()
            .read_to_string(&mut rooms)
            .unwrap();
        assert!(rooms.contains("Hotel Sol (A),GARDEN VIEW,dbl garden,numeric,150,4,1"));
    }

    #[tokio::test]
    async fn test_load_writes_stay_table_when_dates_are_set() {
        let storage = MockStorage::default();
        let mut config = TestConfig::new(INPUT);
        config.output_formats = vec!["csv".to_string()];
        config.stay = Some(DateRange {
            start: chrono::NaiveDate::from_ymd_opt(2025, 9, 28).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
        });
        let pipeline = pipeline_with(storage.clone(), config);

        let sheet = pipeline.extract().await.unwrap();
        let result = pipeline.transform(sheet).await.unwrap();
        pipeline.load(result).await.unwrap();

        let stay = String::from_utf8(storage.get(STAY_FILENAME).unwrap()).unwrap();
        assert!(stay.contains(
            "Hotel Sol (A),dbl garden,High Season,1,28-09-2025,30-09-2025,3,numeric,150"
        ));
    }
}
