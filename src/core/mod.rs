pub mod context;
pub mod dates;
pub mod etl;
pub mod extractor;
pub mod merged;
pub mod periods;
pub mod pipeline;
pub mod price;
pub mod ranges;
pub mod report;

pub use crate::domain::model::ExtractionResult;
pub use crate::domain::ports::{ConfigProvider, Pipeline, RowSource, Storage};
pub use crate::utils::error::Result;
pub use extractor::extract;
