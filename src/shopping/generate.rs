use chrono::NaiveDate;
use tracing::Instrument;
use uuid::Uuid;

use super::aggregate::aggregate;
use super::error::ShoppingError;
use super::materialize::materialize;
use super::store::ShoppingStore;
use super::types::{IngredientLine, IngredientSummary, ShoppingItem, UpcomingMeal, WriteSet};
use crate::telemetry::{self};
use crate::telemetry::ops::shopping::Phase as ShoppingPhase;

/// Everything computed before the first write.
#[derive(Debug)]
pub struct Regeneration {
    pub meals: usize,
    pub summaries: Vec<IngredientSummary>,
    pub write_set: WriteSet,
}

#[derive(Debug)]
pub struct Applied {
    pub deleted: u64,
    pub inserted: Vec<ShoppingItem>,
}

/// Read the schedule window and current items, then compute the write-set. No writes.
pub async fn plan<S: ShoppingStore>(store: &S, group_id: Uuid, from: NaiveDate) -> Result<Regeneration, ShoppingError> {
    let log = telemetry::shopping();

    let meals = store
        .fetch_upcoming_meals(group_id, from)
        .instrument(log.span_kv(&ShoppingPhase::FetchSchedules, [("from", from.to_string())]))
        .await
        .map_err(|source| ShoppingError::StorageRead { what: "scheduled meals", source })?;

    let summaries = {
        let _s = log.span(&ShoppingPhase::Aggregate).entered();
        aggregate(ingredients_of(&meals))?
    };
    log.debug(format!("aggregated {} meals into {} ingredients", meals.len(), summaries.len()));

    let existing = store
        .fetch_shopping_items(group_id)
        .instrument(log.span(&ShoppingPhase::FetchItems))
        .await
        .map_err(|source| ShoppingError::StorageRead { what: "shopping items", source })?;

    let write_set = {
        let _s = log.span(&ShoppingPhase::Materialize).entered();
        materialize(group_id, &summaries, &existing)
    };
    log.write_set(group_id, summaries.len(), write_set.to_delete.len(), write_set.to_insert.len());

    Ok(Regeneration { meals: meals.len(), summaries, write_set })
}

/// Delete the group's auto items, then insert the drafts. Two round-trips, not atomic.
pub async fn apply<S: ShoppingStore>(store: &S, group_id: Uuid, write_set: &WriteSet) -> Result<Applied, ShoppingError> {
    let log = telemetry::shopping();

    let deleted = store
        .delete_auto_items(group_id)
        .instrument(log.span(&ShoppingPhase::DeleteAuto))
        .await
        .map_err(|source| {
            log.error("delete of stale auto items failed; no items inserted");
            ShoppingError::StorageDelete(source)
        })?;
    if deleted as usize != write_set.to_delete.len() {
        // another writer touched the list between plan and apply
        log.warn(format!("expected to delete {} auto items, deleted {}", write_set.to_delete.len(), deleted));
    }

    let inserted = if write_set.to_insert.is_empty() {
        Vec::new()
    } else {
        store
            .insert_items(&write_set.to_insert)
            .instrument(log.span(&ShoppingPhase::InsertAuto))
            .await
            .map_err(|source| {
                log.error("insert failed after stale auto items were removed; re-run generate");
                ShoppingError::StorageInsert { count: write_set.to_insert.len(), source }
            })?
    };

    Ok(Applied { deleted, inserted })
}

/// Full regeneration: plan then apply.
pub async fn regenerate<S: ShoppingStore>(store: &S, group_id: Uuid, from: NaiveDate) -> Result<(Regeneration, Applied), ShoppingError> {
    let regen = plan(store, group_id, from).await?;
    let applied = apply(store, group_id, &regen.write_set).await?;
    Ok((regen, applied))
}

fn ingredients_of(meals: &[UpcomingMeal]) -> impl Iterator<Item = &IngredientLine> {
    meals.iter().filter_map(|m| m.recipe.as_ref()).flat_map(|r| r.ingredients.iter())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::schedule::types::MealType;
    use crate::shopping::types::{RecipeIngredients, ShoppingItemDraft, SourceType};

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum FailAt { None, FetchMeals, FetchItems, Delete, Insert }

    struct MemStore {
        meals: Mutex<Vec<(Uuid, UpcomingMeal)>>,
        items: Mutex<Vec<ShoppingItem>>,
        fail: Mutex<FailAt>,
    }

    impl MemStore {
        fn new() -> Self {
            Self { meals: Mutex::new(Vec::new()), items: Mutex::new(Vec::new()), fail: Mutex::new(FailAt::None) }
        }

        fn fail_at(&self, f: FailAt) { *self.fail.lock().unwrap() = f; }

        fn failing(&self, f: FailAt) -> Result<(), sqlx::Error> {
            if *self.fail.lock().unwrap() == f { Err(sqlx::Error::Protocol("injected".into())) } else { Ok(()) }
        }

        fn schedule(&self, group: Uuid, date: NaiveDate, lines: Option<Vec<IngredientLine>>) {
            let meal = UpcomingMeal {
                schedule_id: Uuid::new_v4(),
                date,
                meal_type: MealType::Dinner,
                recipe: lines.map(|ingredients| RecipeIngredients { recipe_id: Uuid::new_v4(), ingredients }),
            };
            self.meals.lock().unwrap().push((group, meal));
        }

        fn add_item(&self, group: Uuid, name: &str, source_type: SourceType) -> Uuid {
            let item = ShoppingItem {
                id: Uuid::new_v4(),
                group_id: group,
                name: name.into(),
                is_purchased: false,
                source_type,
                created_at: Utc::now(),
            };
            let id = item.id;
            self.items.lock().unwrap().push(item);
            id
        }

        fn names(&self, group: Uuid, source_type: SourceType) -> HashSet<String> {
            self.items.lock().unwrap().iter()
                .filter(|i| i.group_id == group && i.source_type == source_type)
                .map(|i| i.name.clone())
                .collect()
        }
    }

    impl ShoppingStore for MemStore {
        async fn fetch_upcoming_meals(&self, group_id: Uuid, from: NaiveDate) -> Result<Vec<UpcomingMeal>, sqlx::Error> {
            self.failing(FailAt::FetchMeals)?;
            Ok(self.meals.lock().unwrap().iter()
                .filter(|(g, m)| *g == group_id && m.date >= from)
                .map(|(_, m)| m.clone())
                .collect())
        }

        async fn fetch_shopping_items(&self, group_id: Uuid) -> Result<Vec<ShoppingItem>, sqlx::Error> {
            self.failing(FailAt::FetchItems)?;
            Ok(self.items.lock().unwrap().iter().filter(|i| i.group_id == group_id).cloned().collect())
        }

        async fn delete_auto_items(&self, group_id: Uuid) -> Result<u64, sqlx::Error> {
            self.failing(FailAt::Delete)?;
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| !(i.group_id == group_id && i.source_type == SourceType::Auto));
            Ok((before - items.len()) as u64)
        }

        async fn insert_items(&self, drafts: &[ShoppingItemDraft]) -> Result<Vec<ShoppingItem>, sqlx::Error> {
            self.failing(FailAt::Insert)?;
            let rows: Vec<ShoppingItem> = drafts.iter().map(|d| ShoppingItem {
                id: Uuid::new_v4(),
                group_id: d.group_id,
                name: d.name.clone(),
                is_purchased: d.is_purchased,
                source_type: d.source_type,
                created_at: Utc::now(),
            }).collect();
            self.items.lock().unwrap().extend(rows.iter().cloned());
            Ok(rows)
        }
    }

    fn line(name: &str, qty: Option<&str>, unit: Option<&str>) -> IngredientLine {
        IngredientLine { name: name.into(), quantity: qty.map(Into::into), unit: unit.map(Into::into) }
    }

    fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 6, d).unwrap() }

    fn set(names: &[&str]) -> HashSet<String> { names.iter().map(|s| s.to_string()).collect() }

    #[tokio::test]
    async fn regenerates_from_future_meals_and_keeps_manual_items() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(1), Some(vec![line("Stale", Some("1"), None)]));
        store.schedule(g, day(10), Some(vec![line("Tomato", Some("2"), Some("pieces")), line("Onion", Some("1"), Some("piece"))]));
        store.schedule(g, day(11), Some(vec![line("tomato", Some("1"), Some("piece"))]));
        store.schedule(g, day(12), None);
        store.add_item(g, "Milk", SourceType::Manual);
        let old = store.add_item(g, "OldAuto", SourceType::Auto);

        let (regen, applied) = regenerate(&store, g, day(10)).await.unwrap();
        assert_eq!(regen.meals, 3);
        assert_eq!(regen.write_set.to_delete, vec![old]);
        assert_eq!(applied.deleted, 1);
        assert_eq!(applied.inserted.len(), 2);

        assert_eq!(store.names(g, SourceType::Auto), set(&["Tomato 2, 1 piece", "Onion 1 piece"]));
        assert_eq!(store.names(g, SourceType::Manual), set(&["Milk"]));
    }

    #[tokio::test]
    async fn rerun_with_same_schedule_converges() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(5), Some(vec![line("Rice", Some("1"), Some("cup")), line("Egg", Some("2"), None)]));
        store.add_item(g, "Coffee", SourceType::Manual);

        let (first, applied) = regenerate(&store, g, day(1)).await.unwrap();
        let first_ids: HashSet<Uuid> = applied.inserted.iter().map(|i| i.id).collect();

        let second = plan(&store, g, day(1)).await.unwrap();
        let names = |ws: &WriteSet| ws.to_insert.iter().map(|d| d.name.clone()).collect::<HashSet<_>>();
        assert_eq!(names(&first.write_set), names(&second.write_set));
        assert_eq!(second.write_set.to_delete.iter().copied().collect::<HashSet<_>>(), first_ids);

        apply(&store, g, &second.write_set).await.unwrap();
        assert_eq!(store.names(g, SourceType::Auto), set(&["Rice 1 cup", "Egg 2"]));
        assert_eq!(store.names(g, SourceType::Manual), set(&["Coffee"]));
        assert_eq!(store.items.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_window_clears_auto_items() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(2), None);
        store.add_item(g, "a", SourceType::Auto);
        store.add_item(g, "b", SourceType::Auto);
        store.add_item(g, "Bread", SourceType::Manual);

        let (regen, applied) = regenerate(&store, g, day(1)).await.unwrap();
        assert!(regen.summaries.is_empty());
        assert_eq!(applied.deleted, 2);
        assert!(applied.inserted.is_empty());
        assert!(store.names(g, SourceType::Auto).is_empty());
        assert_eq!(store.names(g, SourceType::Manual), set(&["Bread"]));
    }

    #[tokio::test]
    async fn other_groups_are_untouched() {
        let store = MemStore::new();
        let (g, other) = (Uuid::new_v4(), Uuid::new_v4());
        store.schedule(other, day(3), Some(vec![line("Kale", None, None)]));
        store.add_item(other, "Kale", SourceType::Auto);

        regenerate(&store, g, day(1)).await.unwrap();
        assert_eq!(store.names(other, SourceType::Auto), set(&["Kale"]));
    }

    #[tokio::test]
    async fn read_failures_abort_before_any_write() {
        for fail in [FailAt::FetchMeals, FailAt::FetchItems] {
            let store = MemStore::new();
            let g = Uuid::new_v4();
            store.schedule(g, day(3), Some(vec![line("Leek", None, None)]));
            store.add_item(g, "Old", SourceType::Auto);
            store.fail_at(fail);

            let err = regenerate(&store, g, day(1)).await.unwrap_err();
            assert!(matches!(err, ShoppingError::StorageRead { .. }));
            assert!(!err.left_partial_state());
            assert_eq!(store.names(g, SourceType::Auto), set(&["Old"]));
        }
    }

    #[tokio::test]
    async fn delete_failure_skips_insert() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(3), Some(vec![line("Leek", None, None)]));
        store.add_item(g, "Old", SourceType::Auto);
        store.fail_at(FailAt::Delete);

        let err = regenerate(&store, g, day(1)).await.unwrap_err();
        assert!(matches!(err, ShoppingError::StorageDelete(_)));
        assert_eq!(store.names(g, SourceType::Auto), set(&["Old"]));
    }

    #[tokio::test]
    async fn insert_failure_is_recoverable_by_rerun() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(3), Some(vec![line("Leek", Some("2"), None)]));
        store.add_item(g, "Old", SourceType::Auto);
        store.add_item(g, "Soap", SourceType::Manual);
        store.fail_at(FailAt::Insert);

        let err = regenerate(&store, g, day(1)).await.unwrap_err();
        match &err {
            ShoppingError::StorageInsert { count, .. } => assert_eq!(*count, 1),
            other => panic!("expected StorageInsert, got {other:?}"),
        }
        assert!(err.left_partial_state());
        assert!(store.names(g, SourceType::Auto).is_empty());
        assert_eq!(store.names(g, SourceType::Manual), set(&["Soap"]));

        store.fail_at(FailAt::None);
        regenerate(&store, g, day(1)).await.unwrap();
        assert_eq!(store.names(g, SourceType::Auto), set(&["Leek 2"]));
    }

    #[tokio::test]
    async fn blank_ingredient_name_fails_without_writing() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(3), Some(vec![line("Leek", None, None), line(" ", None, None)]));
        store.add_item(g, "Old", SourceType::Auto);

        let err = regenerate(&store, g, day(1)).await.unwrap_err();
        assert!(matches!(err, ShoppingError::InvalidIngredientName { index: 1 }));
        assert_eq!(store.names(g, SourceType::Auto), set(&["Old"]));
    }

    #[tokio::test]
    async fn back_to_back_runs_land_on_the_same_list() {
        let store = MemStore::new();
        let g = Uuid::new_v4();
        store.schedule(g, day(4), Some(vec![line("Pepper", Some("1"), None), line("pepper", Some("2"), None)]));

        regenerate(&store, g, day(1)).await.unwrap();
        let after_one = store.names(g, SourceType::Auto);
        regenerate(&store, g, day(1)).await.unwrap();
        assert_eq!(store.names(g, SourceType::Auto), after_one);
        assert_eq!(after_one, set(&["Pepper 1, 2"]));
    }
}
