use crate::core::merged::{MergeMap, MergedRange};
use crate::domain::model::{Row, ROW_WIDTH};
use crate::domain::ports::RowSource;
use crate::utils::error::Result;
use std::io::Read;

/// 已載入記憶體的試算表：列資料加上合併儲存格範圍
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    rows: Vec<Row>,
    merges: MergeMap,
}

impl MemorySheet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            merges: MergeMap::default(),
        }
    }

    pub fn with_merged_range(mut self, range: MergedRange) -> Self {
        self.merges.push(range);
        self
    }

    pub fn add_merged_range(&mut self, range: MergedRange) {
        self.merges.push(range);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 從 CSV/TSV 讀入；沒有標題列，每列只取前四欄，空字串視為空白
    pub fn from_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row = Row::default();
            for (column, value) in record.iter().take(ROW_WIDTH).enumerate() {
                if !value.trim().is_empty() {
                    row.cells[column] = Some(value.to_string());
                }
            }
            rows.push(row);
        }

        tracing::debug!("Loaded {} rows from delimited input", rows.len());
        Ok(Self::new(rows))
    }

    /// 依副檔名決定分隔符號 (`.tsv` 用 tab，其餘用逗號)
    pub fn delimiter_for(path: &str) -> u8 {
        let is_tsv = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        if is_tsv {
            b'\t'
        } else {
            b','
        }
    }

    fn cell(&self, row_index: usize, col_index: usize) -> Option<&str> {
        self.rows.get(row_index).and_then(|row| row.cell(col_index))
    }
}

impl RowSource for MemorySheet {
    fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    fn resolve_merged(&self, row_index: usize, col_index: usize) -> Option<&str> {
        self.merges
            .resolve(row_index, col_index, |row, col| self.cell(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PRICE_COLUMN;

    #[test]
    fn test_from_csv_keeps_blank_rows_and_first_four_columns() {
        let data = "Hotel Sol (A),,,\n,,,\ndbl standard,,150,,ignored\n\"DBL, SUPERIOR\",,,\n";
        let sheet = MemorySheet::from_delimited(data.as_bytes(), b',').unwrap();

        assert_eq!(sheet.len(), 4);
        let rows: Vec<&Row> = sheet.rows().collect();
        assert!(rows[1].is_blank());
        assert_eq!(rows[2].cell(PRICE_COLUMN), Some("150"));
        assert_eq!(rows[2].cells.len(), 4);
        assert_eq!(rows[3].name(), Some("DBL, SUPERIOR"));
    }

    #[test]
    fn test_from_tsv() {
        let data = "dbl standard\t(1May25 - 30Sep25)\t150\n";
        let sheet = MemorySheet::from_delimited(data.as_bytes(), b'\t').unwrap();
        let row = sheet.rows().next().unwrap();
        assert_eq!(row.period(), Some("(1May25 - 30Sep25)"));
        assert_eq!(row.fallback_price(), None);
    }

    #[test]
    fn test_merged_price_resolves_to_anchor() {
        let sheet = MemorySheet::new(vec![
            Row::new([Some("dbl a"), None, Some("120"), None]),
            Row::new([Some("dbl b"), None, None, None]),
            Row::new([Some("dbl c"), None, None, None]),
        ])
        .with_merged_range(MergedRange::parse_a1("C1:C2").unwrap());

        assert_eq!(sheet.resolve_merged(1, PRICE_COLUMN), Some("120"));
        assert_eq!(sheet.resolve_merged(2, PRICE_COLUMN), None);
    }

    #[test]
    fn test_delimiter_for() {
        assert_eq!(MemorySheet::delimiter_for("rates.tsv"), b'\t');
        assert_eq!(MemorySheet::delimiter_for("rates.TSV"), b'\t');
        assert_eq!(MemorySheet::delimiter_for("rates.csv"), b',');
    }
}
