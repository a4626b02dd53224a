use crate::config::rules::ExtractionRules;
use crate::core::ConfigProvider;
use crate::domain::model::DateRange;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate, SUPPORTED_INPUT_EXTENSIONS};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "rate-sheet")]
#[command(about = "Extract hotels, rooms, prices and periods from a rate sheet export")]
pub struct CliConfig {
    /// CSV/TSV export of the rate sheet
    #[arg(short, long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Merged cell ranges in A1 notation, e.g. C5:C8,C12:C14
    #[arg(long = "merge", value_delimiter = ',')]
    pub merged_ranges: Vec<String>,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<String>,

    /// Bundle every output file into extraction.zip
    #[arg(long)]
    pub zip: bool,

    #[arg(long)]
    pub max_rows: Option<usize>,

    #[arg(long)]
    pub proximity_window: Option<usize>,

    /// Check-in date (YYYY-MM-DD); with --check-out also writes stay.csv
    #[arg(long)]
    pub check_in: Option<NaiveDate>,

    #[arg(long)]
    pub check_out: Option<NaiveDate>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(skip)]
    #[serde(skip)]
    pub rules: ExtractionRules,
}

impl CliConfig {
    /// 解析命令列並把覆寫值套進抽取規則
    pub fn parse_args() -> Self {
        Self::parse().with_rule_overrides()
    }

    pub fn with_rule_overrides(mut self) -> Self {
        if let Some(max_rows) = self.max_rows {
            self.rules.max_rows = max_rows;
        }
        if let Some(window) = self.proximity_window {
            self.rules.proximity_window = window;
        }
        self.rules = self.rules.normalized();
        self
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn merged_ranges(&self) -> &[String] {
        &self.merged_ranges
    }

    fn bundle_output(&self) -> bool {
        self.zip
    }

    fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    fn stay(&self) -> Option<DateRange> {
        validation::validate_stay("stay", &self.check_in, &self.check_out)
            .ok()
            .flatten()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, SUPPORTED_INPUT_EXTENSIONS)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        crate::config::validate_merged_ranges("merge", &self.merged_ranges)?;
        validation::validate_stay("stay", &self.check_in, &self.check_out)?;
        self.rules.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["rate-sheet"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv).with_rule_overrides()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--input", "rates.csv"]);
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.output_formats(), &["json".to_string(), "csv".to_string()]);
        assert!(!config.bundle_output());
        assert_eq!(config.rules(), &ExtractionRules::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_reach_rules() {
        let config = parse(&[
            "-i",
            "rates.tsv",
            "--merge",
            "C5:C8,C12:C14",
            "--formats",
            "csv",
            "--zip",
            "--max-rows",
            "50",
            "--proximity-window",
            "5",
        ]);

        assert_eq!(config.merged_ranges(), &["C5:C8".to_string(), "C12:C14".to_string()]);
        assert_eq!(config.output_formats(), &["csv".to_string()]);
        assert!(config.bundle_output());
        assert!(config.stay().is_none());
        assert_eq!(config.rules().max_rows, 50);
        assert_eq!(config.rules().proximity_window, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        assert!(parse(&["--input", "rates.xlsx"]).validate().is_err());
        assert!(parse(&["--input", "rates.csv", "--merge", "C5-C8"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "rates.csv", "--max-rows", "0"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "rates.csv", "--formats", "xml"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_stay_dates() {
        let config = parse(&[
            "--input",
            "rates.csv",
            "--check-in",
            "2025-05-28",
            "--check-out",
            "2025-06-05",
        ]);
        assert!(config.validate().is_ok());
        let stay = config.stay().unwrap();
        assert_eq!(stay.start, NaiveDate::from_ymd_opt(2025, 5, 28).unwrap());
        assert_eq!(stay.end, NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());

        let half = parse(&["--input", "rates.csv", "--check-in", "2025-05-28"]);
        assert!(matches!(
            half.validate(),
            Err(crate::utils::error::RateSheetError::MissingConfigError { .. })
        ));
        assert!(half.stay().is_none());
    }
}
