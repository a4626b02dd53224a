use crate::domain::model::Price;
use crate::utils::error::{RateSheetError, Result};

/// 價格欄位分類器，負責文字圖例在列之間的繼承
#[derive(Debug, Clone)]
pub struct PriceResolver {
    legends: Vec<String>,
    inherited_legend: Option<String>,
}

impl PriceResolver {
    pub fn new(legends: &[String]) -> Self {
        Self {
            legends: legends.iter().map(|legend| legend.trim().to_lowercase()).collect(),
            inherited_legend: None,
        }
    }

    pub fn inherited_legend(&self) -> Option<&str> {
        self.inherited_legend.as_deref()
    }

    fn is_legend(&self, normalized: &str) -> bool {
        self.legends.iter().any(|legend| legend == normalized)
    }

    /// 分類主要價格欄位 (已解析合併儲存格)
    ///
    /// - 圖例：記住並回傳 `Legend`
    /// - 數字：清除繼承並回傳 `Numeric`
    /// - 其他文字：`InvalidPriceText`，整列不處理
    /// - 空白：有繼承的圖例就沿用，否則 `Absent`
    pub fn resolve(&mut self, raw: Option<&str>) -> Result<Price> {
        let normalized = normalize(raw);

        if normalized.is_empty() {
            return Ok(match &self.inherited_legend {
                Some(legend) => Price::Legend(legend.clone()),
                None => Price::Absent,
            });
        }

        if self.is_legend(&normalized) {
            self.inherited_legend = Some(normalized.clone());
            return Ok(Price::Legend(normalized));
        }

        if is_numeric(&normalized) {
            let value = parse_numeric(&normalized)?;
            self.inherited_legend = None;
            return Ok(Price::Numeric(value));
        }

        Err(RateSheetError::InvalidPriceText {
            text: raw.unwrap_or_default().trim().to_string(),
        })
    }

    /// 備用價格欄位 (BAR)：只分類，不影響繼承狀態
    pub fn fallback(&self, raw: Option<&str>) -> Result<Price> {
        let normalized = normalize(raw);

        if normalized.is_empty() {
            Ok(Price::Absent)
        } else if self.is_legend(&normalized) {
            Ok(Price::Legend(normalized))
        } else if is_numeric(&normalized) {
            parse_numeric(&normalized).map(Price::Numeric)
        } else {
            Err(RateSheetError::InvalidPriceText {
                text: raw.unwrap_or_default().trim().to_string(),
            })
        }
    }
}

fn normalize(raw: Option<&str>) -> String {
    raw.map(|value| value.trim().to_lowercase()).unwrap_or_default()
}

/// 去掉千分位與小數點後只剩數字
///
/// 逗號永遠是千分位，不當小數點：`150,5` 是 1505
fn is_numeric(normalized: &str) -> bool {
    let digits: String = normalized.chars().filter(|c| !matches!(c, '.' | ',')).collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn parse_numeric(normalized: &str) -> Result<f64> {
    normalized
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| RateSheetError::InvalidPriceText {
            text: normalized.to_string(),
        })
}
