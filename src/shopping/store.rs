use chrono::NaiveDate;
use uuid::Uuid;

use super::types::{ShoppingItem, ShoppingItemDraft, UpcomingMeal};

/// Storage boundary used by shopping-list regeneration.
///
/// Each call is one round-trip; nothing here is transactional across calls.
#[allow(async_fn_in_trait)]
pub trait ShoppingStore {
    /// Meals of `group_id` dated `from` or later, with their recipe's ingredients in recipe order.
    async fn fetch_upcoming_meals(&self, group_id: Uuid, from: NaiveDate) -> Result<Vec<UpcomingMeal>, sqlx::Error>;

    async fn fetch_shopping_items(&self, group_id: Uuid) -> Result<Vec<ShoppingItem>, sqlx::Error>;

    /// Delete every auto item of the group; returns the number of rows removed.
    async fn delete_auto_items(&self, group_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn insert_items(&self, drafts: &[ShoppingItemDraft]) -> Result<Vec<ShoppingItem>, sqlx::Error>;
}
