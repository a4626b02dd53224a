use crate::core::Pipeline;
use crate::domain::model::ExtractionStats;
use crate::domain::ports::RowSource;
use crate::utils::error::Result;

/// 一次執行的摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReport {
    pub output_path: String,
    pub stats: ExtractionStats,
}

pub struct RateSheetEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RateSheetEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EngineReport> {
        tracing::info!("🚀 Starting rate sheet extraction...");

        // Extract
        tracing::info!("📥 Reading rate sheet...");
        let sheet = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} rows", sheet.rows().count());

        // Transform
        tracing::info!("🔄 Extracting hotels, rooms and periods...");
        let result = self.pipeline.transform(sheet).await?;
        let stats = result.stats();
        tracing::info!(
            "🔄 Found {} hotels, {} room types, {} rooms, {} periods, {} extras",
            stats.hotels,
            stats.room_types,
            stats.rooms,
            stats.periods,
            stats.extras
        );
        if stats.issues > 0 {
            tracing::warn!("⚠️ {} rows were skipped with issues", stats.issues);
        }

        // Load
        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path);

        Ok(EngineReport { output_path, stats })
    }
}
