//! 逐列掃描費率表的狀態機
//!
//! 每一列依下列順序套用規則，第一個命中的規則決定結果：
//! 1. 空白列：把暫存的房間指派期間並放入房型或飯店
//! 2. 期間欄位：名稱列、括號區間、冒號標籤
//! 3. 沒有名稱：略過
//! 4. 排除字首：略過
//! 5. 飯店 (`(A)` 結尾)
//! 6. 房型 (全大寫且沒有價格)
//! 7. 價格分類 (無效文字整列略過)
//! 8. 房間 (房間字首)
//! 9. 其他有價格的列視為附加項目

use crate::config::rules::ExtractionRules;
use crate::core::price::PriceResolver;
use crate::core::periods::PeriodGrouper;
use crate::core::ranges;
use crate::domain::model::{
    ExtractionResult, Extra, Hotel, PeriodId, Price, Room, RoomType, Row, RowIssue,
};
use crate::utils::error::{RateSheetError, Result};
use std::collections::BTreeSet;

/// 單列處理結果，方便在不依賴列順序的情況下測試每條規則
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Flushed { rooms: usize },
    SeasonLabel,
    HotelOpened,
    RoomTypeOpened,
    RoomBuffered,
    ExtraAttached,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 期間欄位已處理完，或無法解析 (URL、錯誤、只有標籤)
    PeriodCell,
    NoName,
    Excluded,
    InvalidPrice,
    /// 尚未出現任何飯店
    NoHotel,
    RoomWithoutPrice,
    NoPrice,
}

enum PeriodStep {
    NotAPeriod,
    Assigned,
    Done(RowOutcome),
}

pub struct ExtractionContext<'r> {
    rules: &'r ExtractionRules,
    hotels: Vec<Hotel>,
    current_room_type: Option<usize>,
    pending_rooms: Vec<Room>,
    prices: PriceResolver,
    periods: PeriodGrouper,
    issues: Vec<RowIssue>,
}

impl<'r> ExtractionContext<'r> {
    pub fn new(rules: &'r ExtractionRules) -> Self {
        Self {
            rules,
            hotels: Vec::new(),
            current_room_type: None,
            pending_rooms: Vec::new(),
            prices: PriceResolver::new(&rules.legend_prices),
            periods: PeriodGrouper::new(rules.proximity_window, rules.unnamed_group_name.clone()),
            issues: Vec::new(),
        }
    }

    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn pending_rooms(&self) -> &[Room] {
        &self.pending_rooms
    }

    pub fn issues(&self) -> &[RowIssue] {
        &self.issues
    }

    /// 處理一列；`primary_price` 是已解析合併儲存格的主要價格
    pub fn process_row(&mut self, row_index: usize, row: &Row, primary_price: Option<&str>) -> RowOutcome {
        // 1. 空白列
        if row.is_blank() {
            let rooms = self.flush();
            return RowOutcome::Flushed { rooms };
        }

        // 2. 期間
        if let Some(text) = row.period() {
            match self.process_period_cell(text, row_index) {
                PeriodStep::NotAPeriod | PeriodStep::Assigned => {}
                PeriodStep::Done(outcome) => return outcome,
            }
        }

        // 3. 沒有名稱
        let Some(raw_name) = row.name() else {
            return RowOutcome::Skipped(SkipReason::NoName);
        };
        let name = raw_name.trim();
        let lowercase_name = name.to_lowercase();

        // 4. 排除
        if self.rules.is_excluded(&lowercase_name) {
            tracing::trace!(row = row_index, name, "excluded row");
            return RowOutcome::Skipped(SkipReason::Excluded);
        }

        // 5. 飯店
        if self.rules.is_hotel_name(name) {
            self.open_hotel(name);
            return RowOutcome::HotelOpened;
        }

        // 6. 房型
        let price_is_empty = primary_price.map_or(true, |value| value.trim().is_empty());
        if is_all_upper(name) && price_is_empty {
            return self.open_room_type(name, row_index);
        }

        // 7. 價格
        let price = match self.prices.resolve(primary_price) {
            Ok(price) => price,
            Err(err) => {
                self.record(row_index, err);
                return RowOutcome::Skipped(SkipReason::InvalidPrice);
            }
        };

        // 8. 房間
        if self.rules.is_room_name(&lowercase_name) {
            return self.buffer_room(name, price, row, row_index);
        }

        // 9. 附加項目
        self.attach_extra(name, price, row_index)
    }

    fn process_period_cell(&mut self, text: &str, row_index: usize) -> PeriodStep {
        if !ranges::looks_like_period(text) {
            return PeriodStep::NotAPeriod;
        }

        if ranges::is_url(text) {
            tracing::trace!(row = row_index, "ignoring url in period column");
            return PeriodStep::Done(RowOutcome::Skipped(SkipReason::PeriodCell));
        }

        let Some(hotel) = self.hotels.last_mut() else {
            self.record(
                row_index,
                RateSheetError::StructuralAmbiguity {
                    message: format!("period '{}' appears before any hotel", text.trim()),
                },
            );
            return PeriodStep::Done(RowOutcome::Skipped(SkipReason::NoHotel));
        };

        if ranges::is_season_label(text) {
            tracing::debug!(row = row_index, label = text.trim(), "period group opened");
            self.periods.open_label(hotel, text, row_index);
            return PeriodStep::Done(RowOutcome::SeasonLabel);
        }

        match Self::assign_periods(&mut self.periods, hotel, text, row_index) {
            Ok(true) => PeriodStep::Assigned,
            Ok(false) => PeriodStep::Done(RowOutcome::Skipped(SkipReason::PeriodCell)),
            Err(err) => {
                self.record(row_index, err);
                PeriodStep::Done(RowOutcome::Skipped(SkipReason::PeriodCell))
            }
        }
    }

    /// 先試括號區間，沒有結果才試冒號標籤；回傳是否有建立期間
    fn assign_periods(
        periods: &mut PeriodGrouper,
        hotel: &mut Hotel,
        text: &str,
        row_index: usize,
    ) -> Result<bool> {
        let found = ranges::extract_parenthesized(text)?;
        if !found.is_empty() {
            let ids = periods.assign_ranges(hotel, &found, row_index);
            tracing::debug!(row = row_index, periods = ids.len(), "parenthesized periods added");
            return Ok(true);
        }

        match ranges::extract_labeled(text)? {
            Some(ranges::LabeledRange {
                label,
                range: Some(range),
            }) => {
                let id = periods.assign_labeled(hotel, &label, range);
                tracing::debug!(row = row_index, label = %label, %id, "labeled period added");
                Ok(true)
            }
            Some(ranges::LabeledRange { label, range: None }) => {
                tracing::debug!(row = row_index, label = %label, "period label without usable dates");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn open_hotel(&mut self, name: &str) {
        // 上一間飯店暫存的房間先歸位
        self.flush();
        tracing::debug!(hotel = name, "hotel opened");
        self.hotels.push(Hotel::new(name));
        self.periods.reset_for_hotel();
        self.current_room_type = None;
    }

    fn open_room_type(&mut self, name: &str, row_index: usize) -> RowOutcome {
        let Some(hotel) = self.hotels.last_mut() else {
            self.record(
                row_index,
                RateSheetError::StructuralAmbiguity {
                    message: format!("room type '{}' appears before any hotel", name),
                },
            );
            return RowOutcome::Skipped(SkipReason::NoHotel);
        };

        let clean_name = name.trim_end_matches(':').trim();
        hotel.room_types.push(RoomType::new(clean_name));
        self.current_room_type = Some(hotel.room_types.len() - 1);
        tracing::debug!(row = row_index, room_type = clean_name, "room type opened");
        RowOutcome::RoomTypeOpened
    }

    fn buffer_room(&mut self, name: &str, price: Price, row: &Row, row_index: usize) -> RowOutcome {
        let price = if price.is_absent() {
            match self.prices.fallback(row.fallback_price()) {
                Ok(price) => price,
                Err(err) => {
                    self.record(row_index, err);
                    return RowOutcome::Skipped(SkipReason::InvalidPrice);
                }
            }
        } else {
            price
        };

        if price.is_absent() {
            return RowOutcome::Skipped(SkipReason::RoomWithoutPrice);
        }

        if self.hotels.is_empty() {
            self.record(
                row_index,
                RateSheetError::StructuralAmbiguity {
                    message: format!("room '{}' appears before any hotel", name),
                },
            );
            return RowOutcome::Skipped(SkipReason::NoHotel);
        }

        self.pending_rooms.push(Room {
            name: name.to_string(),
            price,
            source_row_index: row_index,
            period_ids: BTreeSet::new(),
        });
        RowOutcome::RoomBuffered
    }

    fn attach_extra(&mut self, name: &str, price: Price, row_index: usize) -> RowOutcome {
        if price.is_absent() {
            return RowOutcome::Skipped(SkipReason::NoPrice);
        }

        let Some(hotel) = self.hotels.last_mut() else {
            self.record(
                row_index,
                RateSheetError::StructuralAmbiguity {
                    message: format!("extra '{}' appears before any hotel", name),
                },
            );
            return RowOutcome::Skipped(SkipReason::NoHotel);
        };

        hotel.extras.push(Extra {
            name: name.to_string(),
            price: price.as_numeric(),
        });
        RowOutcome::ExtraAttached
    }

    /// 暫存房間指派最後一個期間群組的編號，再放入目前房型 (或直接放入飯店)
    pub fn flush(&mut self) -> usize {
        let rooms = std::mem::take(&mut self.pending_rooms);
        let count = rooms.len();
        let room_type = self.current_room_type;

        if let Some(hotel) = self.hotels.last_mut() {
            let period_ids: BTreeSet<PeriodId> = hotel
                .period_groups
                .last()
                .map(|group| group.period_ids().collect())
                .unwrap_or_default();

            let rooms = rooms.into_iter().map(|mut room| {
                room.period_ids.extend(period_ids.iter().copied());
                room
            });

            match room_type.and_then(|index| hotel.room_types.get_mut(index)) {
                Some(room_type) => room_type.rooms.extend(rooms),
                None => hotel.direct_rooms.extend(rooms),
            }
        }

        if count > 0 {
            tracing::trace!(rooms = count, "pending rooms flushed");
        }
        self.periods.clear_label_seen();
        count
    }

    fn record(&mut self, row_index: usize, err: RateSheetError) {
        let Some(kind) = err.issue_kind() else {
            tracing::error!(row = row_index, error = %err, "unexpected error while classifying row");
            return;
        };

        match &err {
            RateSheetError::InvalidPriceText { .. } => {
                tracing::debug!(row = row_index, error = %err, "row rejected");
            }
            _ => {
                tracing::warn!(row = row_index, error = %err, "row skipped");
            }
        }

        self.issues.push(RowIssue {
            row_index,
            kind,
            detail: err.to_string(),
        });
    }

    /// 結束掃描；最後沒有空白列時也會把暫存房間歸位
    pub fn finish(mut self) -> ExtractionResult {
        self.flush();
        ExtractionResult {
            hotels: self.hotels,
            issues: self.issues,
        }
    }
}

/// 至少有一個大寫字母且沒有小寫字母
fn is_all_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::IssueKind;

    fn row(cells: [Option<&str>; 4]) -> Row {
        Row::new(cells)
    }

    fn feed(context: &mut ExtractionContext<'_>, rows: &[[Option<&str>; 4]]) -> Vec<RowOutcome> {
        rows.iter()
            .enumerate()
            .map(|(index, cells)| {
                let row = row(*cells);
                let price = row.cell(crate::domain::model::PRICE_COLUMN).map(str::to_string);
                context.process_row(index, &row, price.as_deref())
            })
            .collect()
    }

    #[test]
    fn test_is_all_upper() {
        assert!(is_all_upper("DBL SUPERIOR:"));
        assert!(is_all_upper("EDIFICIO 2"));
        assert!(!is_all_upper("Dbl Superior"));
        assert!(!is_all_upper("123"));
    }

    #[test]
    fn test_each_rule_outcome() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);

        let outcomes = feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [None, Some("High Season"), None, None],
                [None, Some("(1Jun25 - 31Aug25)"), None, None],
                [Some("Promotion 10% off"), None, Some("10"), None],
                [Some("GARDEN:"), None, None, None],
                [Some("dbl garden"), None, Some("150"), None],
                [Some("Breakfast"), None, Some("12"), None],
                [Some("Late checkout"), None, Some("on request"), None],
                [Some("sgl garden"), None, None, None],
                [Some("Notes"), None, None, None],
                [None, None, None, None],
            ],
        );

        assert_eq!(
            outcomes,
            vec![
                RowOutcome::HotelOpened,
                RowOutcome::SeasonLabel,
                RowOutcome::Skipped(SkipReason::NoName),
                RowOutcome::Skipped(SkipReason::Excluded),
                RowOutcome::RoomTypeOpened,
                RowOutcome::RoomBuffered,
                RowOutcome::ExtraAttached,
                RowOutcome::Skipped(SkipReason::InvalidPrice),
                RowOutcome::Skipped(SkipReason::RoomWithoutPrice),
                RowOutcome::Skipped(SkipReason::NoPrice),
                RowOutcome::Flushed { rooms: 1 },
            ]
        );

        let hotel = &context.hotels()[0];
        assert_eq!(hotel.room_types[0].name, "GARDEN");
        assert_eq!(hotel.room_types[0].rooms[0].period_ids, BTreeSet::from([PeriodId(1)]));
        assert_eq!(hotel.extras[0].price, Some(12.0));
        assert_eq!(context.issues()[0].kind, IssueKind::InvalidPriceText);
    }

    #[test]
    fn test_rooms_wait_for_blank_row() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("dbl standard"), None, Some("100"), None],
            ],
        );

        assert_eq!(context.pending_rooms().len(), 1);
        assert!(context.hotels()[0].direct_rooms.is_empty());

        let result = context.finish();
        assert_eq!(result.hotels[0].direct_rooms.len(), 1);
    }

    #[test]
    fn test_fallback_price_column() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("dbl bar"), None, None, Some("210")],
                [Some("tpl bar"), None, None, Some("ask us")],
            ],
        );

        let result = context.finish();
        let rooms = &result.hotels[0].direct_rooms;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].price, Price::Numeric(210.0));
        assert_eq!(result.issues[0].row_index, 2);
    }

    #[test]
    fn test_rows_before_first_hotel_are_reported() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        let outcomes = feed(
            &mut context,
            &[
                [Some("dbl orphan"), None, Some("90"), None],
                [Some("Parking"), None, Some("15"), None],
                [None, Some("Low Season"), None, None],
            ],
        );

        assert!(outcomes
            .iter()
            .all(|outcome| *outcome == RowOutcome::Skipped(SkipReason::NoHotel)));
        let result = context.finish();
        assert!(result.hotels.is_empty());
        assert_eq!(result.issues.len(), 3);
        assert!(result
            .issues
            .iter()
            .all(|issue| issue.kind == IssueKind::StructuralAmbiguity));
    }

    #[test]
    fn test_unparseable_period_skips_row() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        let outcomes = feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("dbl standard"), Some("(1May25 - soon)"), Some("100"), None],
            ],
        );

        assert_eq!(outcomes[1], RowOutcome::Skipped(SkipReason::PeriodCell));
        let result = context.finish();
        assert!(result.hotels[0].period_groups.is_empty());
        assert!(result.hotels[0].direct_rooms.is_empty());
        assert_eq!(result.issues[0].kind, IssueKind::UnparseableDateRange);
    }

    #[test]
    fn test_period_row_with_room_continues() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        let outcomes = feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("dbl standard"), Some("(1May25 - 30Sep25)"), Some("100"), None],
                [Some("dbl superior"), Some("New Year: 26Dec25 - 3Jan26"), Some("140"), None],
                [None, Some("https://example.com/rates"), None, None],
            ],
        );

        assert_eq!(outcomes[1], RowOutcome::RoomBuffered);
        assert_eq!(outcomes[2], RowOutcome::RoomBuffered);
        assert_eq!(outcomes[3], RowOutcome::Skipped(SkipReason::PeriodCell));

        let result = context.finish();
        let hotel = &result.hotels[0];
        assert_eq!(hotel.period_groups.len(), 2);
        assert_eq!(hotel.period_groups[1].name, "New Year");
        // 兩間房都拿到最後一個群組的期間
        for room in &hotel.direct_rooms {
            assert_eq!(room.period_ids, BTreeSet::from([PeriodId(2)]));
        }
    }

    #[test]
    fn test_hotel_boundary_flushes_previous_hotel() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("SUITES"), None, None, None],
                [Some("dbl suite"), None, Some("300"), None],
                [Some("Hotel Luna (A)"), None, None, None],
                [Some("dbl luna"), None, Some("80"), None],
            ],
        );

        let result = context.finish();
        assert_eq!(result.hotels.len(), 2);
        assert_eq!(result.hotels[0].room_types[0].rooms[0].name, "dbl suite");
        assert!(result.hotels[1].room_types.is_empty());
        assert_eq!(result.hotels[1].direct_rooms[0].name, "dbl luna");
    }

    #[test]
    fn test_uppercase_row_with_price_is_not_a_room_type() {
        let rules = ExtractionRules::default();
        let mut context = ExtractionContext::new(&rules);
        let outcomes = feed(
            &mut context,
            &[
                [Some("Hotel Sol (A)"), None, None, None],
                [Some("DBL STANDARD"), None, Some("100"), None],
            ],
        );
        assert_eq!(outcomes[1], RowOutcome::RoomBuffered);
    }
}
