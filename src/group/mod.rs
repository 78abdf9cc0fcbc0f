mod db;
pub mod types;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;

use crate::config::Context;
use crate::telemetry::{self};
use crate::telemetry::ops::group::Phase as GroupPhase;

/// meal group create/join/ls
#[derive(Args)]
pub struct GroupCmd {
    #[command(subcommand)]
    pub cmd: GroupSub,
}

#[derive(Subcommand)]
pub enum GroupSub {
    /// Create a group and print its invitation code
    Create { name: String },
    /// Join a group with an invitation code
    Join { code: String },
    /// List groups the user belongs to
    Ls,
}

pub async fn run(pool: &PgPool, ctx: &Context, args: GroupCmd) -> Result<()> {
    let user_id = ctx.require_user()?;
    let log = telemetry::group();
    let _g = log.root_span_kv([("user", user_id.to_string())]).entered();
    match args.cmd {
        GroupSub::Create { name } => {
            let name = name.trim();
            if name.is_empty() { bail!("Group name is required"); }
            let _s = log.span(&GroupPhase::Create).entered();
            let created = db::create_group(pool, name, user_id).await?;
            log.info(format!("👥 Group created: {} ({})", created.name, created.id));
            log.info(format!("   Invitation code: {}", created.invitation_code));
            if telemetry::config::json_mode() {
                log.result(&created)?;
            }
        }
        GroupSub::Join { code } => {
            let Some(code) = normalize_code(&code) else { bail!("Invitation code is required") };
            let found = {
                let _s = log.span(&GroupPhase::Lookup).entered();
                db::find_by_code(pool, &code).await?
            };
            let Some((group_id, name)) = found else { bail!("Invalid invitation code") };
            let _s = log.span(&GroupPhase::Join).entered();
            if db::is_member(pool, group_id, user_id).await? || !db::add_member(pool, group_id, user_id).await? {
                bail!("You are already a member of this group");
            }
            log.info(format!("👋 Joined group: {} ({})", name, group_id));
            if telemetry::config::json_mode() {
                log.result(&types::GroupJoined { id: group_id, name })?;
            }
        }
        GroupSub::Ls => {
            let _s = log.span(&GroupPhase::List).entered();
            let groups = db::list_groups(pool, user_id).await?;
            log.info("👥 Groups:");
            for g in &groups {
                log.info(format!("[{}] {} role={} code={}", g.id, g.name, g.role, g.invitation_code));
            }
            if telemetry::config::json_mode() {
                log.result(&types::GroupList { groups })?;
            }
        }
    }
    Ok(())
}

/// Codes are matched trimmed and upper-cased; None when nothing is left.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() { None } else { Some(code.to_uppercase()) }
}
