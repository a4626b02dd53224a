use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROWS: usize = 300;
pub const DEFAULT_PROXIMITY_WINDOW: usize = 3;
pub const DEFAULT_HOTEL_MARKER: &str = "(A)";
pub const UNNAMED_GROUP_NAME: &str = "SIN NOMBRE DE GRUPO";

/// 列分類規則。所有欄位都有預設值，TOML 只需覆寫要調整的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// 最多處理的列數
    pub max_rows: usize,
    /// 期間名稱列與日期列之間允許的最大距離 (含)
    pub proximity_window: usize,
    /// 飯店名稱結尾標記
    pub hotel_marker: String,
    /// 房間名稱前綴 (小寫比對)
    pub room_prefixes: Vec<String>,
    /// 可當作價格的文字圖例
    pub legend_prices: Vec<String>,
    /// 名稱以這些字開頭的列會被略過
    pub exclusion_prefixes: Vec<String>,
    /// 沒有期間名稱時使用的群組名稱
    pub unnamed_group_name: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            proximity_window: DEFAULT_PROXIMITY_WINDOW,
            hotel_marker: DEFAULT_HOTEL_MARKER.to_string(),
            room_prefixes: to_strings(&["dbl", "sgl", "tpl"]),
            legend_prices: to_strings(&["closing agreement"]),
            exclusion_prefixes: to_strings(&[
                "season rates",
                "(per room)",
                "closing agreement",
                "rates includes",
                "promotion",
                "not included",
                "high speed",
                "minimum stay",
                "other benefits",
            ]),
            unnamed_group_name: UNNAMED_GROUP_NAME.to_string(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl ExtractionRules {
    pub fn is_room_name(&self, lowercase_name: &str) -> bool {
        self.room_prefixes
            .iter()
            .any(|prefix| lowercase_name.starts_with(prefix.as_str()))
    }

    pub fn is_excluded(&self, lowercase_name: &str) -> bool {
        self.exclusion_prefixes
            .iter()
            .any(|prefix| lowercase_name.starts_with(prefix.as_str()))
    }

    pub fn is_hotel_name(&self, name: &str) -> bool {
        name.trim_end().ends_with(self.hotel_marker.as_str())
    }

    /// 規則比對一律用小寫，載入後統一正規化
    pub fn normalized(mut self) -> Self {
        for list in [
            &mut self.room_prefixes,
            &mut self.legend_prices,
            &mut self.exclusion_prefixes,
        ] {
            for value in list.iter_mut() {
                *value = value.trim().to_lowercase();
            }
        }
        self
    }
}

impl Validate for ExtractionRules {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("rules.max_rows", self.max_rows, 1)?;
        validation::validate_range("rules.proximity_window", self.proximity_window, 0, 50)?;
        validation::validate_non_empty_string("rules.hotel_marker", &self.hotel_marker)?;
        validation::validate_non_empty_string("rules.unnamed_group_name", &self.unnamed_group_name)?;
        validation::validate_non_empty_list("rules.room_prefixes", &self.room_prefixes)?;
        for prefix in &self.room_prefixes {
            validation::validate_non_empty_string("rules.room_prefixes", prefix)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = ExtractionRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.proximity_window, 3);
        assert_eq!(rules.max_rows, 300);
    }

    #[test]
    fn test_room_and_exclusion_prefixes() {
        let rules = ExtractionRules::default();
        assert!(rules.is_room_name("dbl superior"));
        assert!(rules.is_room_name("tpl"));
        assert!(!rules.is_room_name("breakfast"));
        assert!(rules.is_excluded("promotion early booking"));
        assert!(rules.is_excluded("(per room) per night"));
        assert!(!rules.is_excluded("dbl promotion"));
    }

    #[test]
    fn test_hotel_marker() {
        let rules = ExtractionRules::default();
        assert!(rules.is_hotel_name("Hotel Paradise (A)"));
        assert!(rules.is_hotel_name("Hotel Paradise (A)  "));
        assert!(!rules.is_hotel_name("Hotel Paradise (a)"));
    }

    #[test]
    fn test_normalized_lowercases_lists() {
        let rules = ExtractionRules {
            room_prefixes: vec![" DBL ".to_string()],
            legend_prices: vec!["BAR 20% Com".to_string()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(rules.room_prefixes, vec!["dbl"]);
        assert_eq!(rules.legend_prices, vec!["bar 20% com"]);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let rules = ExtractionRules {
            max_rows: 0,
            ..Default::default()
        };
        assert!(rules.validate().is_err());

        let rules = ExtractionRules {
            room_prefixes: vec![],
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }
}
