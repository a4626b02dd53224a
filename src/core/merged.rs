use crate::utils::error::{RateSheetError, Result};

/// 合併儲存格範圍 (0-based，含頭含尾)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergedRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    /// 左上角錨點
    pub fn anchor(&self) -> (usize, usize) {
        (self.first_row, self.first_col)
    }

    /// 解析 A1 表示法，例如 `C5:C8`；單一儲存格 `C5` 也接受
    pub fn parse_a1(value: &str) -> Result<Self> {
        let invalid = || RateSheetError::InvalidMergedRange {
            value: value.to_string(),
        };

        let (start, end) = match value.trim().split_once(':') {
            Some((start, end)) => (start, end),
            None => (value.trim(), value.trim()),
        };
        let (first_row, first_col) = parse_cell_ref(start).ok_or_else(invalid)?;
        let (last_row, last_col) = parse_cell_ref(end).ok_or_else(invalid)?;

        Ok(Self::new(first_row, first_col, last_row, last_col))
    }
}

/// `C5` -> (4, 2)
fn parse_cell_ref(cell: &str) -> Option<(usize, usize)> {
    let cell = cell.trim().to_ascii_uppercase();
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);

    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let col = letters
        .bytes()
        .try_fold(0usize, |acc, b| acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize))?;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((row - 1, col - 1))
}

/// 合併範圍查詢表
#[derive(Debug, Clone, Default)]
pub struct MergeMap {
    ranges: Vec<MergedRange>,
}

impl MergeMap {
    pub fn new(ranges: Vec<MergedRange>) -> Self {
        Self { ranges }
    }

    pub fn push(&mut self, range: MergedRange) {
        self.ranges.push(range);
    }

    /// 座標落在合併範圍內時回傳錨點座標，否則原樣回傳
    pub fn anchor_of(&self, row: usize, col: usize) -> (usize, usize) {
        self.ranges
            .iter()
            .find(|range| range.contains(row, col))
            .map(MergedRange::anchor)
            .unwrap_or((row, col))
    }

    pub fn resolve<'a, F>(&self, row: usize, col: usize, cell: F) -> Option<&'a str>
    where
        F: Fn(usize, usize) -> Option<&'a str>,
    {
        let (anchor_row, anchor_col) = self.anchor_of(row, col);
        cell(anchor_row, anchor_col)
    }
}
