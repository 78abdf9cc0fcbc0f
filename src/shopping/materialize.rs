use uuid::Uuid;

use super::types::{IngredientSummary, ShoppingItem, ShoppingItemDraft, SourceType, WriteSet};

/// Compute the write-set for a full replace of a group's auto items.
///
/// Every auto item of `group_id` is deleted; manual items and other groups' rows are left alone.
/// One unpurchased auto draft is produced per summary.
pub fn materialize(group_id: Uuid, summaries: &[IngredientSummary], existing: &[ShoppingItem]) -> WriteSet {
    let to_delete = existing
        .iter()
        .filter(|item| item.group_id == group_id && item.source_type == SourceType::Auto)
        .map(|item| item.id)
        .collect();

    let to_insert = summaries
        .iter()
        .map(|summary| ShoppingItemDraft {
            group_id,
            name: display_line(summary),
            is_purchased: false,
            source_type: SourceType::Auto,
        })
        .collect();

    WriteSet { to_delete, to_insert }
}

/// "name quantity unit" with empty parts dropped and single spaces between the rest.
pub fn display_line(summary: &IngredientSummary) -> String {
    [
        summary.display_name.as_str(),
        summary.quantity.as_str(),
        summary.unit.as_deref().unwrap_or(""),
    ]
    .iter()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
