mod db;
pub mod types;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Context;
use crate::telemetry::{self};
use crate::telemetry::ops::schedule::Phase as SchedulePhase;
use crate::util::time::{parse_date_arg, parse_date_opt};

use types::{MealType, ScheduleDay, ScheduleRow};

/// meal schedule add/ls/rm
#[derive(Args)]
pub struct ScheduleCmd {
    #[command(subcommand)]
    pub cmd: ScheduleSub,
}

#[derive(Subcommand)]
pub enum ScheduleSub {
    /// Put a recipe (or an empty slot) on the calendar
    Add {
        /// today, YYYY-MM-DD, +Nd or -Nd
        date: String,
        #[arg(long, value_enum, default_value_t = MealType::Dinner)]
        meal: MealType,
        #[arg(long)]
        recipe: Option<Uuid>,
    },
    /// Show scheduled meals grouped by day
    Ls {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Remove a scheduled meal
    Rm { id: Uuid },
}

pub async fn run(pool: &PgPool, ctx: &Context, args: ScheduleCmd) -> Result<()> {
    let group_id = ctx.require_group()?;
    let log = telemetry::schedule();
    let _g = log.root_span_kv([("group", group_id.to_string())]).entered();
    match args.cmd {
        ScheduleSub::Add { date, meal, recipe } => {
            let date = parse_date_arg(&date)?;
            let _s = log.span(&SchedulePhase::Add).entered();
            let Some(id) = db::insert_schedule(pool, group_id, date, meal, recipe).await? else {
                bail!("Recipe not found in this group: {}", recipe.map(|r| r.to_string()).unwrap_or_default());
            };
            log.info(format!("📅 Scheduled {} on {} ({})", meal, date, id));
            if telemetry::config::json_mode() {
                log.result(&types::ScheduleAdded { id, date, meal_type: meal, recipe_id: recipe })?;
            }
        }
        ScheduleSub::Ls { from, to } => {
            let from = parse_date_opt(&from)?;
            let to = parse_date_opt(&to)?;
            let _s = log.span(&SchedulePhase::List).entered();
            let rows = db::list_schedules(pool, group_id, from, to).await?;
            let days = group_by_day(rows);
            for day in &days {
                log.info(format!("📅 {}", day.date));
                for m in &day.meals {
                    log.info(format!("   {:<9} {}  {}", m.meal_type, m.recipe_name.as_deref().unwrap_or("(no recipe)"), m.id));
                }
            }
            if telemetry::config::json_mode() {
                log.result(&types::ScheduleList { days })?;
            }
        }
        ScheduleSub::Rm { id } => {
            let _s = log.span(&SchedulePhase::Remove).entered();
            let removed = db::delete_schedule(pool, group_id, id).await?;
            if removed { log.info("🗑️ Scheduled meal removed"); } else { log.warn(format!("No scheduled meal {} in this group", id)); }
            if telemetry::config::json_mode() {
                log.result(&types::ScheduleRemoved { id, removed })?;
            }
        }
    }
    Ok(())
}

/// Bucket date-ordered rows by day; within a day breakfast comes first and snack last.
pub fn group_by_day(rows: Vec<ScheduleRow>) -> Vec<ScheduleDay> {
    let mut days: Vec<ScheduleDay> = Vec::new();
    for row in rows {
        match days.last_mut() {
            Some(day) if day.date == row.date => day.meals.push(row),
            _ => days.push(ScheduleDay { date: row.date, meals: vec![row] }),
        }
    }
    for day in &mut days {
        day.meals.sort_by_key(|m| m.meal_type.day_order());
    }
    days
}
