use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

static MIGRATOR: Migrator = sqlx::migrate!();

/// meal init: create/upgrade the `meal` schema (plan-only by default; use --apply to migrate)
#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

#[derive(Serialize)]
struct MigrationInfo {
    version: i64,
    description: String,
}

#[derive(Serialize)]
struct InitPlan {
    pending: Vec<MigrationInfo>,
}

#[derive(Serialize)]
struct InitResult {
    applied: Vec<MigrationInfo>,
}

pub async fn run(pool: &PgPool, args: InitCmd) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span_kv([("mode", if args.apply { "apply".to_string() } else { "plan".to_string() })]).entered();

    let pending = {
        let _s = log.span(&InitPhase::Pending).entered();
        let applied = applied_versions(pool).await?;
        pending_migrations(&applied)
    };

    if !args.apply {
        let _s = log.span(&InitPhase::Plan).entered();
        log.info(format!("📝 Init plan — {} pending migration(s)", pending.len()));
        for m in &pending {
            log.info(format!("   {} {}", m.version, m.description));
        }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&InitPlan { pending })?;
        }
        return Ok(());
    }

    let _s = log.span(&InitPhase::Migrate).entered();
    MIGRATOR.run(pool).await?;
    log.info(format!("✅ Database initialized ({} migration(s) applied)", pending.len()));
    if telemetry::config::json_mode() {
        log.result(&InitResult { applied: pending })?;
    }
    Ok(())
}

// Versions already recorded by sqlx; empty when the bookkeeping table does not exist yet.
async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(Vec::new());
    }
    let versions = sqlx::query_scalar::<_, i64>("SELECT version FROM public._sqlx_migrations WHERE success ORDER BY version")
        .fetch_all(pool)
        .await?;
    Ok(versions)
}

fn pending_migrations(applied: &[i64]) -> Vec<MigrationInfo> {
    MIGRATOR
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .map(|m| MigrationInfo { version: m.version, description: m.description.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_migrations_are_pending_on_a_fresh_database() {
        let pending = pending_migrations(&[]);
        assert!(!pending.is_empty());
        assert!(pending.windows(2).all(|w| w[0].version < w[1].version));
    }

    #[test]
    fn applied_versions_are_not_pending() {
        let all: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert!(pending_migrations(&all).is_empty());
    }
}
