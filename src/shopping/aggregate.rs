use std::collections::HashMap;

use super::error::ShoppingError;
use super::normalize::normalize_key;
use super::types::{IngredientLine, IngredientSummary};

/// Fold ingredient lines into one summary per normalized name, in first-seen order.
///
/// - display name: the first spelling encountered for the key
/// - quantity: non-empty quantity texts joined with `", "`; never summed. A missing or blank
///   quantity adds nothing, so `["1", None]` yields `"1"` rather than `"1, "`
/// - unit: last line wins, including a missing unit
pub fn aggregate<'a, I>(ingredients: I) -> Result<Vec<IngredientSummary>, ShoppingError>
where
    I: IntoIterator<Item = &'a IngredientLine>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<IngredientSummary> = Vec::new();

    for (index, line) in ingredients.into_iter().enumerate() {
        if line.name.trim().is_empty() {
            return Err(ShoppingError::InvalidIngredientName { index });
        }
        let key = normalize_key(&line.name);
        let quantity = line.quantity.as_deref().map(str::trim).unwrap_or("");

        match slots.get(&key) {
            Some(&slot) => {
                let summary = &mut out[slot];
                append_quantity(&mut summary.quantity, quantity);
                summary.unit = line.unit.clone();
            }
            None => {
                slots.insert(key.clone(), out.len());
                out.push(IngredientSummary {
                    normalized_key: key,
                    display_name: line.name.clone(),
                    quantity: quantity.to_string(),
                    unit: line.unit.clone(),
                });
            }
        }
    }
    Ok(out)
}

fn append_quantity(running: &mut String, next: &str) {
    if next.is_empty() {
        return;
    }
    if !running.is_empty() {
        running.push_str(", ");
    }
    running.push_str(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, qty: Option<&str>, unit: Option<&str>) -> IngredientLine {
        IngredientLine { name: name.into(), quantity: qty.map(Into::into), unit: unit.map(Into::into) }
    }

    #[test]
    fn same_name_different_case_merges_quantities_and_takes_last_unit() {
        let input = vec![
            line("Tomato", Some("2"), Some("pieces")),
            line("tomato", Some("1"), Some("piece")),
            line("Onion", Some("1"), Some("piece")),
        ];
        let out = aggregate(&input).unwrap();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].display_name, "Tomato");
        assert_eq!(out[0].quantity, "2, 1");
        assert_eq!(out[0].unit.as_deref(), Some("piece"));

        assert_eq!(out[1].display_name, "Onion");
        assert_eq!(out[1].quantity, "1");
        assert_eq!(out[1].unit.as_deref(), Some("piece"));
    }

    #[test]
    fn units_are_never_converted() {
        let input = vec![line("Flour", Some("3"), Some("pieces")), line("flour ", Some("200"), Some("g"))];
        let out = aggregate(&input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].unit.as_deref(), Some("g"));
        assert_eq!(out[0].quantity, "3, 200");
    }

    #[test]
    fn missing_unit_on_last_line_wins() {
        let input = vec![line("Salt", Some("1"), Some("tsp")), line("salt", Some("a pinch"), None)];
        let out = aggregate(&input).unwrap();
        assert_eq!(out[0].unit, None);
        assert_eq!(out[0].quantity, "1, a pinch");
    }

    #[test]
    fn first_spelling_is_kept_for_display() {
        let input = vec![line("garlic", None, None), line("GARLIC", Some("2"), Some("cloves"))];
        let out = aggregate(&input).unwrap();
        assert_eq!(out[0].display_name, "garlic");
        assert_eq!(out[0].normalized_key, "garlic");
        assert_eq!(out[0].quantity, "2");
    }

    #[test]
    fn empty_quantities_leave_no_dangling_separator() {
        let input = vec![
            line("Milk", Some("1"), Some("l")),
            line("milk", None, Some("l")),
            line("MILK", Some("  "), Some("l")),
            line("milk", Some("500"), Some("ml")),
        ];
        let out = aggregate(&input).unwrap();
        assert_eq!(out[0].quantity, "1, 500");
        assert_eq!(out[0].unit.as_deref(), Some("ml"));

        let trailing = vec![line("Egg", Some("1"), None), line("egg", None, None)];
        assert_eq!(aggregate(&trailing).unwrap()[0].quantity, "1");
    }

    #[test]
    fn output_keeps_first_seen_order() {
        let input = vec![
            line("Zucchini", None, None),
            line("apple", None, None),
            line("zucchini", None, None),
            line("Mango", None, None),
        ];
        let names: Vec<_> = aggregate(&input).unwrap().into_iter().map(|s| s.display_name).collect();
        assert_eq!(names, vec!["Zucchini", "apple", "Mango"]);
    }

    #[test]
    fn count_never_exceeds_input_and_matches_when_names_are_distinct() {
        let distinct = vec![line("a", None, None), line("b", None, None), line("c", None, None)];
        assert_eq!(aggregate(&distinct).unwrap().len(), distinct.len());

        let dup = vec![line("a", None, None), line(" A", None, None), line("c", None, None)];
        assert!(aggregate(&dup).unwrap().len() < dup.len());

        let empty: Vec<IngredientLine> = Vec::new();
        assert!(aggregate(&empty).unwrap().is_empty());
    }

    #[test]
    fn blank_name_is_rejected_with_its_position() {
        let input = vec![line("Egg", Some("2"), None), line("   ", Some("1"), None)];
        match aggregate(&input) {
            Err(ShoppingError::InvalidIngredientName { index }) => assert_eq!(index, 1),
            other => panic!("expected InvalidIngredientName, got {other:?}"),
        }
    }
}
