//! 單一日期字詞的解析，例如 `1May25`、`1st May 2025`、`May 1, 25`

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn ordinal_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)(?:st|nd|rd|th)").expect("valid ordinal regex"))
}

fn day_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2})\s*([A-Za-z]{3,})\.?\s*(\d{2,4})?\s*$")
            .expect("valid day-first regex")
    })
}

fn month_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z]{3,})\.?\s*(\d{1,2})(?:[,\s]+(\d{2,4}))?\s*$")
            .expect("valid month-first regex")
    })
}

/// 移除日期序數後綴：`1st` -> `1`
pub fn strip_ordinals(text: &str) -> String {
    ordinal_suffix_re().replace_all(text, "$1").into_owned()
}

/// 月份全名或三字母縮寫 (不分大小寫) 轉為 1-12
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == name || month[..3] == name)
        .map(|index| index as u32 + 1)
}

/// 兩位數年份一律視為 20YY
fn expand_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// 解析單一日期字詞；格式不符、缺少年份或日期不存在時回傳 None
pub fn parse_date_token(text: &str) -> Option<NaiveDate> {
    let cleaned = strip_ordinals(text.trim());
    if cleaned.is_empty() {
        return None;
    }

    let (day, month, year) = if let Some(caps) = day_first_re().captures(&cleaned) {
        (caps.get(1)?, caps.get(2)?, caps.get(3))
    } else if let Some(caps) = month_first_re().captures(&cleaned) {
        (caps.get(2)?, caps.get(1)?, caps.get(3))
    } else {
        return None;
    };

    let day: u32 = day.as_str().parse().ok()?;
    let month = month_number(month.as_str())?;
    let year: i32 = year?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(expand_year(year), month, day)
}
