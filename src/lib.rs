pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, MemorySheet};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ExtractionRules, TomlConfig};

pub use core::etl::{EngineReport, RateSheetEngine};
pub use core::extractor::extract;
pub use core::pipeline::RateSheetPipeline;
pub use domain::model::{
    days_per_period, DateRange, Extra, ExtractionResult, ExtractionStats, Hotel, IssueKind, Period,
    PeriodGroup, PeriodId, Price, Room, RoomType, Row, RowIssue, UnifiedRoom,
};
pub use domain::ports::RowSource;
pub use utils::error::{RateSheetError, Result};
