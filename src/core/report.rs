//! 抽取結果的扁平表格輸出 (CSV)

use crate::domain::model::{days_per_period, DateRange, ExtractionResult, Hotel, Room};
use crate::utils::error::{RateSheetError, Result};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
struct RoomRecord<'a> {
    hotel: &'a str,
    room_type: &'a str,
    room: &'a str,
    price_kind: &'a str,
    price: String,
    source_row: usize,
    period_ids: String,
}

#[derive(Serialize)]
struct RateRecord<'a> {
    hotel: &'a str,
    room: String,
    group: &'a str,
    period_id: u32,
    start_date: String,
    end_date: String,
    price_kind: &'a str,
    price: String,
    source_row: usize,
}

#[derive(Serialize)]
struct StayRecord<'a> {
    hotel: &'a str,
    room: String,
    group: &'a str,
    period_id: u32,
    from: String,
    to: String,
    days: i64,
    price_kind: &'a str,
    price: String,
}

#[derive(Serialize)]
struct PeriodRecord<'a> {
    hotel: &'a str,
    group: &'a str,
    id: u32,
    label: &'a str,
    start_date: String,
    end_date: String,
}

#[derive(Serialize)]
struct ExtraRecord<'a> {
    hotel: &'a str,
    extra: &'a str,
    price: Option<f64>,
}

#[derive(Serialize)]
struct IssueRecord<'a> {
    row: usize,
    kind: &'a str,
    detail: &'a str,
}

fn write_records<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| RateSheetError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| RateSheetError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

fn join_ids(room: &Room) -> String {
    room.period_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

pub fn rooms_csv(result: &ExtractionResult) -> Result<String> {
    let mut records = Vec::new();
    for hotel in &result.hotels {
        for room_type in &hotel.room_types {
            for room in &room_type.rooms {
                records.push(room_record(hotel, &room_type.name, room));
            }
        }
        for room in &hotel.direct_rooms {
            records.push(room_record(hotel, "", room));
        }
    }
    write_records(records)
}

fn room_record<'a>(hotel: &'a Hotel, room_type: &'a str, room: &'a Room) -> RoomRecord<'a> {
    RoomRecord {
        hotel: &hotel.name,
        room_type,
        room: &room.name,
        price_kind: room.price.kind(),
        price: room.price.to_string(),
        source_row: room.source_row_index,
        period_ids: join_ids(room),
    }
}

/// 合併同名房間後，每個房間 × 期間一列價格
pub fn rates_csv(result: &ExtractionResult) -> Result<String> {
    let mut records = Vec::new();
    for hotel in &result.hotels {
        for room in hotel.unified_rooms() {
            for id in room.all_period_ids() {
                let (Some(variant), Some(period), Some(group)) = (
                    room.variant_for_period(id),
                    hotel.period_by_id(id),
                    hotel.group_of(id),
                ) else {
                    continue;
                };
                records.push(RateRecord {
                    hotel: &hotel.name,
                    room: room.name.clone(),
                    group: &group.name,
                    period_id: id.0,
                    start_date: format_date(period.start_date),
                    end_date: format_date(period.end_date),
                    price_kind: variant.price.kind(),
                    price: variant.price.to_string(),
                    source_row: variant.source_row_index,
                });
            }
        }
    }
    write_records(records)
}

/// 入住區間內每個房間在各期間的價格與天數
pub fn stay_csv(result: &ExtractionResult, stay: DateRange) -> Result<String> {
    let mut records = Vec::new();
    for hotel in &result.hotels {
        let periods = hotel.periods_overlapping(stay.start, stay.end);
        if periods.is_empty() {
            tracing::debug!(
                "{}: no period overlaps {} - {}",
                hotel.name,
                stay.start,
                stay.end
            );
            continue;
        }
        let days = days_per_period(stay.start, stay.end, &periods);

        for room in hotel.unified_rooms() {
            let prices = room.prices_for_periods(periods.iter().map(|period| period.id));
            for period in &periods {
                let (Some(price), Some(overlap), Some(group)) = (
                    prices.get(&period.id),
                    period.overlap(stay.start, stay.end),
                    hotel.group_of(period.id),
                ) else {
                    continue;
                };
                records.push(StayRecord {
                    hotel: &hotel.name,
                    room: room.name.clone(),
                    group: &group.name,
                    period_id: period.id.0,
                    from: format_date(overlap.start),
                    to: format_date(overlap.end),
                    days: days.get(&period.id).copied().unwrap_or_default(),
                    price_kind: price.kind(),
                    price: price.to_string(),
                });
            }
        }
    }
    write_records(records)
}

pub fn periods_csv(result: &ExtractionResult) -> Result<String> {
    let records = result.hotels.iter().flat_map(|hotel| {
        hotel.period_groups.iter().flat_map(move |group| {
            group.periods.iter().map(move |period| PeriodRecord {
                hotel: &hotel.name,
                group: &group.name,
                id: period.id.0,
                label: period.label.as_deref().unwrap_or_default(),
                start_date: format_date(period.start_date),
                end_date: format_date(period.end_date),
            })
        })
    });
    write_records(records)
}

pub fn extras_csv(result: &ExtractionResult) -> Result<String> {
    let records = result.hotels.iter().flat_map(|hotel| {
        hotel.extras.iter().map(move |extra| ExtraRecord {
            hotel: &hotel.name,
            extra: &extra.name,
            price: extra.price,
        })
    });
    write_records(records)
}

pub fn issues_csv(result: &ExtractionResult) -> Result<String> {
    let records = result.issues.iter().map(|issue| IssueRecord {
        row: issue.row_index,
        kind: issue.kind.as_str(),
        detail: &issue.detail,
    });
    write_records(records)
}
