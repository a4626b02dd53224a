//! 從期間欄位文字中找出日期區間
//!
//! 支援三種寫法：
//! - 期間名稱列：`Low Season`、`SPECIAL DATES`
//! - 括號區間：`(1May25 - 30Sep25) (12Dec25 - 27Dec25)`
//! - 冒號標籤：`New Year: 26Dec25 - 3Jan26`、`Easter: 2-5Apr26`

use crate::core::dates::{parse_date_token, strip_ordinals};
use crate::domain::model::DateRange;
use crate::utils::error::{RateSheetError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn parenthesized_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]*)\)").expect("valid parenthesis regex"))
}

fn range_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*(?:-|–|—|/|\bto\b)\s*").expect("valid separator regex")
    })
}

fn dash_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*(?:-|–|—)\s*").expect("valid dash regex"))
}

fn compact_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}[A-Za-z]{3}\d{2}").expect("valid compact date regex"))
}

fn leading_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d{1,2}\s*(.+)$").expect("valid leading day regex"))
}

/// 冒號標籤的解析結果；日期解析失敗時仍保留標籤
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRange {
    pub label: String,
    pub range: Option<DateRange>,
}

pub fn is_url(text: &str) -> bool {
    text.to_lowercase().contains("http")
}

pub fn is_season_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("season") || lower.contains("special dates")
}

/// 期間欄位是否值得交給區間解析
pub fn looks_like_period(text: &str) -> bool {
    is_season_label(text) || parenthesized_re().is_match(text) || compact_date_re().is_match(text)
}

/// 以第一個分隔符號切開 (`-`、`–`、`—`、`/` 或 `to`)
fn split_range(text: &str) -> Option<(&str, &str)> {
    split_once_with(range_separator_re(), text)
}

fn split_once_with<'a>(re: &Regex, text: &'a str) -> Option<(&'a str, &'a str)> {
    let found = re.find(text)?;
    Some((text[..found.start()].trim(), text[found.end()..].trim()))
}

fn build_range(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<DateRange> {
    if end < start {
        return Err(RateSheetError::InvertedDateRange { start, end });
    }
    Ok(DateRange { start, end })
}

/// 解析括號內的所有區間
///
/// 任何一組切開後有一邊無法解析，整列視為錯誤，不回傳部分結果。
pub fn extract_parenthesized(text: &str) -> Result<Vec<DateRange>> {
    let mut ranges = Vec::new();

    for caps in parenthesized_re().captures_iter(text) {
        let part = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if part.is_empty() {
            continue;
        }

        match split_range(part) {
            Some((left, right)) if !left.is_empty() && !right.is_empty() => {
                match (parse_date_token(left), parse_date_token(right)) {
                    (Some(start), Some(end)) => ranges.push(build_range(start, end)?),
                    _ => {
                        return Err(RateSheetError::UnparseableDateRange {
                            text: part.to_string(),
                        })
                    }
                }
            }
            Some(_) => {
                // 只有一個字詞 (例如多了前後的分隔符號)，再試一次內部的破折號
                let token = part.trim_matches(|c: char| {
                    c.is_whitespace() || matches!(c, '-' | '–' | '—' | '/')
                });
                if let Some((left, right)) = split_once_with(dash_separator_re(), token) {
                    if let (Some(start), Some(end)) = (parse_date_token(left), parse_date_token(right)) {
                        ranges.push(build_range(start, end)?);
                    }
                }
            }
            // 單一日期，不構成區間
            None => {}
        }
    }

    Ok(ranges)
}

/// 左邊只有日 (例如 `2-5Apr26` 的 `2`) 時，向右邊借用月份與年份
fn borrow_month_and_year(left: &str, right: &str) -> String {
    if left.chars().count() > 2 {
        return left.to_string();
    }
    let right = strip_ordinals(right);
    match leading_day_re().captures(&right).and_then(|caps| caps.get(1)) {
        Some(rest) => format!("{}{}", left, rest.as_str()),
        None => left.to_string(),
    }
}

/// 解析 `標籤: 開始 - 結束`；沒有冒號時回傳 None
pub fn extract_labeled(text: &str) -> Result<Option<LabeledRange>> {
    let Some((label, rest)) = text.split_once(':') else {
        return Ok(None);
    };
    let label = label.trim().to_string();

    let range = match split_range(rest.trim()) {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => {
            let left = borrow_month_and_year(left, right);
            match (parse_date_token(&left), parse_date_token(right)) {
                (Some(start), Some(end)) => Some(build_range(start, end)?),
                _ => None,
            }
        }
        _ => None,
    };

    Ok(Some(LabeledRange { label, range }))
}
