use std::ops::Range;

use super::prompt_builder::{ItemLimits, format_item};
use crate::core::models::ExtractedItem;

/// Splits `items` into consecutive ranges whose formatted size, separators
/// included, stays under `max_batch_chars`. An item that alone exceeds the
/// limit gets its own batch.
#[must_use]
pub fn plan_batches(
    items: &[ExtractedItem],
    limits: ItemLimits,
    max_batch_chars: usize,
) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, item) in items.iter().enumerate() {
        let size = format_item(i - start + 1, item, limits).chars().count();
        let separator = usize::from(i > start);
        if i > start && used + separator + size > max_batch_chars {
            batches.push(start..i);
            start = i;
            used = size;
        } else {
            used += separator + size;
        }
    }
    if start < items.len() {
        batches.push(start..items.len());
    }
    batches
}
