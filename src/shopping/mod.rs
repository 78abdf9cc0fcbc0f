pub mod aggregate;
pub mod db;
pub mod error;
pub mod generate;
pub mod materialize;
pub mod normalize;
pub mod store;
pub mod types;

use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Context;
use crate::telemetry::{self};
use crate::telemetry::ops::shopping::Phase as ShoppingPhase;
use crate::util::time::parse_date_arg;

use db::PgShoppingStore;
use types::SourceType;

/// meal shopping ls/add/toggle/rm/generate
#[derive(Args)]
pub struct ShoppingCmd {
    #[command(subcommand)]
    pub cmd: ShoppingSub,
}

#[derive(Subcommand)]
pub enum ShoppingSub {
    /// List the group's shopping items, newest first
    Ls {
        /// Only items not yet purchased
        #[arg(long, default_value_t = false)]
        pending: bool,
    },
    /// Add a manual item (never touched by generate)
    Add { name: String },
    /// Flip the purchased flag of an item
    Toggle { id: Uuid },
    /// Delete an item
    Rm { id: Uuid },
    // rebuild auto items from scheduled meals (plan-only by default; use --apply to write)
    Generate {
        /// First day of the window: today, YYYY-MM-DD, +Nd or -Nd
        #[arg(long, default_value = "today")]
        from: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
}

pub async fn run(pool: &PgPool, ctx: &Context, args: ShoppingCmd) -> Result<()> {
    let group_id = ctx.require_group()?;
    match args.cmd {
        ShoppingSub::Ls { pending } => ls_items(pool, group_id, pending).await?,
        ShoppingSub::Add { name } => add_item(pool, group_id, name).await?,
        ShoppingSub::Toggle { id } => toggle_item(pool, group_id, id).await?,
        ShoppingSub::Rm { id } => rm_item(pool, group_id, id).await?,
        ShoppingSub::Generate { from, apply } => generate_items(pool, group_id, &from, apply).await?,
    }
    Ok(())
}

async fn generate_items(pool: &PgPool, group_id: Uuid, from: &str, apply: bool) -> Result<()> {
    let started = Instant::now();
    let from = parse_date_arg(from)?;
    let log = telemetry::shopping();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("group", group_id.to_string()),
        ("from", from.to_string()),
    ]).entered();

    let store = PgShoppingStore::new(pool.clone());
    let regen = generate::plan(&store, group_id, from).await?;

    if !apply {
        let _s = log.span(&ShoppingPhase::Plan).entered();
        log.info(format!(
            "📝 Shopping plan — meals={} ingredients={} delete_auto={} insert_auto={}",
            regen.meals, regen.summaries.len(), regen.write_set.to_delete.len(), regen.write_set.to_insert.len()
        ));
        for draft in &regen.write_set.to_insert {
            log.info(format!("   + {}", draft.name));
        }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::GeneratePlan {
                group_id,
                from,
                meals: regen.meals,
                ingredients: regen.summaries,
                write_set: regen.write_set,
            };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let applied = match generate::apply(&store, group_id, &regen.write_set).await {
        Ok(applied) => applied,
        Err(e) => {
            if e.left_partial_state() {
                log.warn("Generated items may be missing until `meal shopping generate --apply` is re-run");
            }
            return Err(e.into());
        }
    };
    log.info(format!("🛒 Shopping list generated — removed={} added={}", applied.deleted, applied.inserted.len()));
    if telemetry::config::json_mode() {
        let result = types::GenerateResult {
            group_id,
            from,
            deleted: applied.deleted as usize,
            inserted: applied.inserted,
        };
        log.result_timed(&result, started)?;
    }
    Ok(())
}

async fn ls_items(pool: &PgPool, group_id: Uuid, pending: bool) -> Result<()> {
    let log = telemetry::shopping();
    let _g = log.root_span_kv([("group", group_id.to_string()), ("pending", pending.to_string())]).entered();
    let _s = log.span(&ShoppingPhase::List).entered();
    let items = db::list_items(pool, group_id, pending).await?;
    log.info(format!("🛒 Shopping list ({} items):", items.len()));
    for item in &items {
        let mark = if item.is_purchased { "x" } else { " " };
        let tag = match item.source_type { SourceType::Auto => " (auto)", SourceType::Manual => "" };
        log.info(format!("[{}] {}{}  {}", mark, item.name, tag, item.id));
    }
    if telemetry::config::json_mode() {
        log.result(&types::ShoppingList { items })?;
    }
    Ok(())
}

async fn add_item(pool: &PgPool, group_id: Uuid, name: String) -> Result<()> {
    let log = telemetry::shopping();
    let _g = log.root_span_kv([("group", group_id.to_string())]).entered();
    let name = name.trim();
    if name.is_empty() { bail!("Item name is required"); }
    let _s = log.span(&ShoppingPhase::Add).entered();
    let item = db::add_manual_item(pool, group_id, name).await?;
    log.info_kv("➕ Item added", [("id", item.id.to_string()), ("name", item.name.clone())]);
    if telemetry::config::json_mode() {
        log.result(&item)?;
    }
    Ok(())
}

async fn toggle_item(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<()> {
    let log = telemetry::shopping();
    let _g = log.root_span_kv([("group", group_id.to_string()), ("id", id.to_string())]).entered();
    let _s = log.span(&ShoppingPhase::Toggle).entered();
    let Some(item) = db::toggle_item(pool, group_id, id).await? else {
        bail!("Shopping item not found: {}", id);
    };
    log.info(format!("{} {}", if item.is_purchased { "✅ Purchased:" } else { "↩️ Not purchased:" }, item.name));
    if telemetry::config::json_mode() {
        log.result(&item)?;
    }
    Ok(())
}

async fn rm_item(pool: &PgPool, group_id: Uuid, id: Uuid) -> Result<()> {
    let log = telemetry::shopping();
    let _g = log.root_span_kv([("group", group_id.to_string()), ("id", id.to_string())]).entered();
    let _s = log.span(&ShoppingPhase::Remove).entered();
    let removed = db::remove_item(pool, group_id, id).await?;
    if removed { log.info("🗑️ Item removed"); } else { log.warn(format!("No shopping item {} in this group", id)); }
    if telemetry::config::json_mode() {
        log.result(&types::ItemRemoved { id, removed })?;
    }
    Ok(())
}
