use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use anyhow::{Context as _, Result};
use dotenvy::dotenv;
use std::env;

mod config;
mod group;
mod init;
mod output;
mod recipe;
mod schedule;
mod shopping;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "meal", about = "Shared meal planning: groups, recipes, schedule and shopping list")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Acting user (falls back to MEAL_USER_ID)
    #[arg(global = true, long)]
    user: Option<String>,
    /// Active group (falls back to MEAL_GROUP_ID)
    #[arg(global = true, long)]
    group: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init(init::InitCmd),
    Group(group::GroupCmd),
    Recipe(recipe::RecipeCmd),
    Schedule(schedule::ScheduleCmd),
    Shopping(shopping::ShoppingCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs always go to stderr; RUST_LOG and MEAL_LOG_FORMAT apply
    telemetry::config::init_tracing();
    let ctx = config::Context::resolve(cli.user, cli.group)?;
    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("Please provide --dsn or set DATABASE_URL in .env")?;

    let pool = PgPoolOptions::new().max_connections(5).connect(&dsn).await?;

    match cli.command {
        Commands::Init(args) => init::run(&pool, args).await?,
        Commands::Group(args) => group::run(&pool, &ctx, args).await?,
        Commands::Recipe(args) => recipe::run(&pool, &ctx, args).await?,
        Commands::Schedule(args) => schedule::run(&pool, &ctx, args).await?,
        Commands::Shopping(args) => shopping::run(&pool, &ctx, args).await?,
    }

    Ok(())
}
