#[cfg(feature = "cli")]
pub mod cli;
pub mod rules;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use rules::ExtractionRules;
pub use toml_config::TomlConfig;

use crate::core::merged::MergedRange;
use crate::utils::error::{RateSheetError, Result};

/// 合併範圍必須是合法的 A1 表示法
pub fn validate_merged_ranges(field_name: &str, ranges: &[String]) -> Result<()> {
    for range in ranges {
        MergedRange::parse_a1(range).map_err(|_| RateSheetError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: range.clone(),
            reason: "Expected A1 notation such as C5:C8".to_string(),
        })?;
    }
    Ok(())
}
