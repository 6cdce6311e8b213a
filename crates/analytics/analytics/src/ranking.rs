//! Top-N rankings.

use std::collections::HashMap;
use tutorhub_core::EntityAggregate;

/// Chart colours, assigned by rank and reused once exhausted.
pub const PALETTE: [&str; 8] = [
    "#4F46E5", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#EC4899", "#84CC16",
];

/// Colour for the item at `index`, wrapping around the palette.
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub label: String,
    pub value: f64,
}

/// Ranks entities by value, highest first, keeping at most `limit`.
///
/// Rows for the same entity are merged first. The sort is stable, so
/// equal values keep the order the store returned them in.
pub fn rank(rows: Vec<EntityAggregate>, limit: usize) -> Vec<RankedItem> {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut merged: Vec<RankedItem> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(&row.entity_id) {
            Some(&i) => merged[i].value += row.value,
            None => {
                positions.insert(row.entity_id, merged.len());
                merged.push(RankedItem {
                    label: row.label,
                    value: row.value,
                });
            }
        }
    }

    merged.sort_by(|a, b| b.value.total_cmp(&a.value));
    merged.truncate(limit);
    merged
}
