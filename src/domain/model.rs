use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 每列固定的欄位數：名稱、期間、主要價格、備用價格 (BAR)
pub const ROW_WIDTH: usize = 4;
pub const NAME_COLUMN: usize = 0;
pub const PERIOD_COLUMN: usize = 1;
pub const PRICE_COLUMN: usize = 2;
pub const FALLBACK_PRICE_COLUMN: usize = 3;

/// 試算表中的一列，空白儲存格一律為 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: [Option<String>; ROW_WIDTH],
}

impl Row {
    pub fn new(cells: [Option<&str>; ROW_WIDTH]) -> Self {
        Self {
            cells: cells.map(|cell| cell.map(str::to_string)),
        }
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells
            .get(column)
            .and_then(|cell| cell.as_deref())
            .filter(|value| !value.trim().is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.cell(NAME_COLUMN)
    }

    pub fn period(&self) -> Option<&str> {
        self.cell(PERIOD_COLUMN)
    }

    pub fn fallback_price(&self) -> Option<&str> {
        self.cell(FALLBACK_PRICE_COLUMN)
    }

    pub fn is_blank(&self) -> bool {
        (0..ROW_WIDTH).all(|column| self.cell(column).is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub u32);

impl std::fmt::Display for PeriodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 含頭含尾的日期區間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub label: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    /// 與 `[start, end]` 的重疊區間 (頭尾都算)，沒有重疊時回傳 None
    pub fn overlap(&self, start: NaiveDate, end: NaiveDate) -> Option<DateRange> {
        let from = self.start_date.max(start);
        let to = self.end_date.min(end);
        (from <= to).then_some(DateRange { start: from, end: to })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodGroup {
    pub name: String,
    pub periods: Vec<Period>,
}

impl PeriodGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            periods: Vec::new(),
        }
    }

    pub fn period_ids(&self) -> impl Iterator<Item = PeriodId> + '_ {
        self.periods.iter().map(|period| period.id)
    }
}

/// 房價：數字、允許的文字圖例，或沒有價格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Price {
    Numeric(f64),
    Legend(String),
    Absent,
}

impl Price {
    pub fn is_absent(&self) -> bool {
        matches!(self, Price::Absent)
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Price::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// 輸出表格用的種類名稱
    pub fn kind(&self) -> &'static str {
        match self {
            Price::Numeric(_) => "numeric",
            Price::Legend(_) => "legend",
            Price::Absent => "absent",
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Numeric(value) => write!(f, "{}", value),
            Price::Legend(text) => write!(f, "{}", text),
            Price::Absent => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub price: Price,
    pub source_row_index: usize,
    pub period_ids: BTreeSet<PeriodId>,
}

impl Room {
    /// 比對用的鍵值 (小寫)
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub name: String,
    pub rooms: Vec<Room>,
}

impl RoomType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rooms: Vec::new(),
        }
    }

    pub fn find_room(&self, name: &str) -> Option<&Room> {
        let key = name.trim().to_lowercase();
        self.rooms.iter().find(|room| room.key() == key)
    }
}

/// 同名房間 (不分大小寫) 合併後的檢視
///
/// 同一個房名在不同季節各出現一列時，每一列都是一個變體，
/// 各自帶著自己的價格與期間。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRoom {
    pub name: String,
    pub variants: Vec<Room>,
}

impl UnifiedRoom {
    /// 第一個涵蓋該期間的變體
    pub fn variant_for_period(&self, id: PeriodId) -> Option<&Room> {
        self.variants.iter().find(|room| room.period_ids.contains(&id))
    }

    pub fn price_for_period(&self, id: PeriodId) -> Option<&Price> {
        self.variant_for_period(id)
            .map(|room| &room.price)
            .filter(|price| !price.is_absent())
    }

    /// 只收有價格的期間
    pub fn prices_for_periods(
        &self,
        ids: impl IntoIterator<Item = PeriodId>,
    ) -> BTreeMap<PeriodId, &Price> {
        ids.into_iter()
            .filter_map(|id| self.price_for_period(id).map(|price| (id, price)))
            .collect()
    }

    pub fn all_period_ids(&self) -> BTreeSet<PeriodId> {
        self.variants
            .iter()
            .flat_map(|room| room.period_ids.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    pub room_types: Vec<RoomType>,
    pub direct_rooms: Vec<Room>,
    pub period_groups: Vec<PeriodGroup>,
    pub extras: Vec<Extra>,
}

impl Hotel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room_types: Vec::new(),
            direct_rooms: Vec::new(),
            period_groups: Vec::new(),
            extras: Vec::new(),
        }
    }

    pub fn period_by_id(&self, id: PeriodId) -> Option<&Period> {
        self.period_groups
            .iter()
            .flat_map(|group| group.periods.iter())
            .find(|period| period.id == id)
    }

    /// 找出擁有該期間的群組
    pub fn group_of(&self, id: PeriodId) -> Option<&PeriodGroup> {
        self.period_groups
            .iter()
            .find(|group| group.periods.iter().any(|period| period.id == id))
    }

    pub fn group_by_name(&self, name: &str) -> Option<&PeriodGroup> {
        self.period_groups.iter().find(|group| group.name == name)
    }

    /// 先列出房型底下的房間，再列出直接掛在飯店的房間
    pub fn rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        self.room_types
            .iter()
            .flat_map(|room_type| room_type.rooms.iter())
            .chain(self.direct_rooms.iter())
    }

    pub fn find_room(&self, name: &str) -> Option<&Room> {
        let key = name.trim().to_lowercase();
        self.rooms().find(|room| room.key() == key)
    }

    pub fn room_type(&self, name: &str) -> Option<&RoomType> {
        self.room_types.iter().find(|room_type| room_type.name == name)
    }

    /// 依小寫房名合併房間，保留第一次出現的順序與寫法
    pub fn unified_rooms(&self) -> Vec<UnifiedRoom> {
        let mut unified: Vec<UnifiedRoom> = Vec::new();

        for room in self.rooms() {
            let key = room.key();
            match unified
                .iter_mut()
                .find(|entry| entry.name.trim().to_lowercase() == key)
            {
                Some(entry) => entry.variants.push(room.clone()),
                None => unified.push(UnifiedRoom {
                    name: room.name.clone(),
                    variants: vec![room.clone()],
                }),
            }
        }

        unified
    }

    /// 與入住區間 `[check_in, check_out]` 重疊的所有期間，依開始日期排序
    pub fn periods_overlapping(&self, check_in: NaiveDate, check_out: NaiveDate) -> Vec<&Period> {
        let mut periods: Vec<&Period> = self
            .period_groups
            .iter()
            .flat_map(|group| group.periods.iter())
            .filter(|period| period.overlap(check_in, check_out).is_some())
            .collect();
        periods.sort_by_key(|period| period.start_date);
        periods
    }
}

/// 入住區間落在各期間的天數，頭尾兩天都算
pub fn days_per_period(
    check_in: NaiveDate,
    check_out: NaiveDate,
    periods: &[&Period],
) -> BTreeMap<PeriodId, i64> {
    periods
        .iter()
        .filter_map(|period| {
            let overlap = period.overlap(check_in, check_out)?;
            Some((period.id, (overlap.end - overlap.start).num_days() + 1))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnparseableDateRange,
    InvertedDateRange,
    InvalidPriceText,
    StructuralAmbiguity,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::UnparseableDateRange => "unparseable_date_range",
            IssueKind::InvertedDateRange => "inverted_date_range",
            IssueKind::InvalidPriceText => "invalid_price_text",
            IssueKind::StructuralAmbiguity => "structural_ambiguity",
        }
    }
}

/// 可恢復的列級問題，依列順序記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_index: usize,
    pub kind: IssueKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub hotels: Vec<Hotel>,
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub hotels: usize,
    pub room_types: usize,
    pub rooms: usize,
    pub periods: usize,
    pub extras: usize,
    pub issues: usize,
}

impl ExtractionResult {
    pub fn hotel(&self, name: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.name == name)
    }

    pub fn stats(&self) -> ExtractionStats {
        let mut stats = ExtractionStats {
            hotels: self.hotels.len(),
            issues: self.issues.len(),
            ..Default::default()
        };
        for hotel in &self.hotels {
            stats.room_types += hotel.room_types.len();
            stats.rooms += hotel.rooms().count();
            stats.periods += hotel
                .period_groups
                .iter()
                .map(|group| group.periods.len())
                .sum::<usize>();
            stats.extras += hotel.extras.len();
        }
        stats
    }
}
