use crate::config::rules::ExtractionRules;
use crate::core::context::ExtractionContext;
use crate::domain::model::{ExtractionResult, PRICE_COLUMN};
use crate::domain::ports::RowSource;

/// 單次、依序掃描列來源並建立飯店模型
///
/// 只處理前 `rules.max_rows` 列；主要價格欄一律經過合併儲存格解析。
pub fn extract<S: RowSource>(source: &S, rules: &ExtractionRules) -> ExtractionResult {
    let mut context = ExtractionContext::new(rules);
    let mut processed = 0usize;

    for (row_index, row) in source.rows().take(rules.max_rows).enumerate() {
        let primary_price = source.resolve_merged(row_index, PRICE_COLUMN);
        let outcome = context.process_row(row_index, row, primary_price);
        tracing::trace!(row = row_index, ?outcome, "row classified");
        processed += 1;
    }

    let result = context.finish();
    let stats = result.stats();
    tracing::debug!(
        rows = processed,
        hotels = stats.hotels,
        rooms = stats.rooms,
        periods = stats.periods,
        issues = stats.issues,
        "extraction pass finished"
    );
    result
}
