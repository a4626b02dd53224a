use crate::config::rules::ExtractionRules;
use crate::core::ConfigProvider;
use crate::domain::model::DateRange;
use crate::domain::ports::DEFAULT_BUNDLE_FILENAME;
use crate::utils::error::{RateSheetError, Result};
use crate::utils::validation::{self, Validate, SUPPORTED_INPUT_EXTENSIONS};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub sheet: SheetConfig,
    #[serde(default)]
    pub rules: ExtractionRules,
    pub load: LoadConfig,
    #[serde(default)]
    pub stay: Option<StayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub input_path: String,
    /// A1 表示法，例如 `"C5:C8"`
    #[serde(default)]
    pub merged_ranges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    #[serde(default = "default_bundle_filename")]
    pub filename: String,
}

/// 日期用字串寫，例如 `check_in = "2025-05-28"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StayConfig {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

fn default_output_formats() -> Vec<String> {
    vec!["json".to_string(), "csv".to_string()]
}

fn default_bundle_filename() -> String {
    DEFAULT_BUNDLE_FILENAME.to_string()
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RateSheetError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| RateSheetError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.rules = config.rules.normalized();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${RATE_SHEET_DIR})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_re()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("sheet.input_path", &self.sheet.input_path)?;
        validation::validate_file_extension(
            "sheet.input_path",
            &self.sheet.input_path,
            SUPPORTED_INPUT_EXTENSIONS,
        )?;
        crate::config::validate_merged_ranges("sheet.merged_ranges", &self.sheet.merged_ranges)?;

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(compression) = &self.load.compression {
            validation::validate_file_extension(
                "load.compression.filename",
                &compression.filename,
                &["zip"],
            )?;
        }

        if let Some(stay) = &self.stay {
            validation::validate_stay("stay", &stay.check_in, &stay.check_out)?;
        }

        self.rules.validate()
    }

    pub fn compression_enabled(&self) -> bool {
        self.load
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.sheet.input_path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn merged_ranges(&self) -> &[String] {
        &self.sheet.merged_ranges
    }

    fn bundle_output(&self) -> bool {
        self.compression_enabled()
    }

    fn bundle_filename(&self) -> &str {
        self.load
            .compression
            .as_ref()
            .map(|c| c.filename.as_str())
            .unwrap_or(DEFAULT_BUNDLE_FILENAME)
    }

    fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    fn stay(&self) -> Option<DateRange> {
        let stay = self.stay.as_ref()?;
        validation::validate_stay("stay", &stay.check_in, &stay.check_out)
            .ok()
            .flatten()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
