mod db;
pub mod types;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Context;
use crate::telemetry::{self};
use crate::telemetry::ops::recipe::Phase as RecipePhase;

use types::NewIngredient;

/// meal recipe add/ls/show/edit/rm
#[derive(Args)]
pub struct RecipeCmd {
    #[command(subcommand)]
    pub cmd: RecipeSub,
}

#[derive(Subcommand)]
pub enum RecipeSub {
    /// Create a recipe with its ingredients and tags
    Add {
        name: String,
        #[arg(long, default_value = "")]
        instructions: String,
        #[arg(long)]
        image_url: Option<String>,
        /// "name|quantity|unit"; repeat per ingredient. Blank names are skipped.
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Comma-separated tag names
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// List the group's recipes
    Ls {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one recipe with ingredients and tags
    Show { id: Uuid },
    /// Change a recipe; omitted fields keep their stored value
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        instructions: Option<String>,
        /// An empty value clears the image
        #[arg(long)]
        image_url: Option<String>,
        /// Replaces the whole ingredient list; "name|quantity|unit", repeat per ingredient
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Drop every ingredient (ignored when --ingredient is given)
        #[arg(long, default_value_t = false)]
        clear_ingredients: bool,
        /// Replaces the tag set; comma-separated, empty clears
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a recipe (ingredients go with it)
    Rm { id: Uuid },
}

pub async fn run(pool: &PgPool, ctx: &Context, args: RecipeCmd) -> Result<()> {
    let group_id = ctx.require_group()?;
    let log = telemetry::recipe();
    let _g = log.root_span_kv([("group", group_id.to_string())]).entered();
    match args.cmd {
        RecipeSub::Add { name, instructions, image_url, ingredients, tags } => {
            let name = name.trim();
            if name.is_empty() { bail!("Recipe name is required"); }
            let ingredients: Vec<NewIngredient> = ingredients.iter().filter_map(|s| parse_ingredient_arg(s)).collect();
            let tags = parse_tags(&tags);
            let image_url = image_url.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let recipe = db::NewRecipe {
                name,
                instructions: instructions.trim(),
                image_url,
                ingredients: &ingredients,
                tags: &tags,
            };
            let id = {
                let _s = log.span_kv(&RecipePhase::Insert, [
                    ("ingredients", ingredients.len().to_string()),
                    ("tags", tags.len().to_string()),
                ]).entered();
                db::insert_recipe(pool, group_id, &recipe).await?
            };
            log.info(format!("🍳 Recipe added: {} ({}) ingredients={} tags={}", name, id, ingredients.len(), tags.len()));
            if telemetry::config::json_mode() {
                log.result(&types::RecipeAdded { id, ingredients: ingredients.len(), tags })?;
            }
        }
        RecipeSub::Ls { search } => {
            let search = search_term(search.as_deref());
            let _s = log.span_kv(&RecipePhase::List, [("search", search.unwrap_or_default().to_string())]).entered();
            let recipes = db::list_recipes(pool, group_id, search).await?;
            log.info(format!("📖 Recipes ({}):", recipes.len()));
            for r in &recipes {
                log.info(format!("[{}] {}", r.id, r.name));
            }
            if telemetry::config::json_mode() {
                log.result(&types::RecipeList { recipes })?;
            }
        }
        RecipeSub::Show { id } => {
            let _s = log.span(&RecipePhase::Show).entered();
            let Some(recipe) = db::get_recipe(pool, group_id, id).await? else {
                bail!("Recipe not found: {}", id);
            };
            let ingredients = db::list_ingredients(pool, id).await?;
            let tags = db::list_tags(pool, id).await?;
            log.info(format!("🍳 {}", recipe.name));
            for ing in &ingredients {
                let line = [Some(ing.name.as_str()), ing.quantity.as_deref(), ing.unit.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                log.info(format!("   • {}", line));
            }
            if !tags.is_empty() { log.info(format!("   tags: {}", tags.join(", "))); }
            if !recipe.instructions.is_empty() { log.info(format!("   {}", recipe.instructions)); }
            if telemetry::config::json_mode() {
                log.result(&types::RecipeDetail { recipe, ingredients, tags })?;
            }
        }
        RecipeSub::Edit { id, name, instructions, image_url, ingredients, clear_ingredients, tags } => {
            let changes = recipe_changes(name, instructions, image_url, &ingredients, clear_ingredients, tags)?;
            let updated = {
                let _s = log.span_kv(&RecipePhase::Update, [
                    ("id", id.to_string()),
                    ("ingredients", changes.ingredients.as_ref().map_or("kept".to_string(), |i| i.len().to_string())),
                    ("tags", changes.tags.as_ref().map_or("kept".to_string(), |t| t.len().to_string())),
                ]).entered();
                db::update_recipe(pool, group_id, id, &changes).await?
            };
            if !updated {
                bail!("Recipe not found: {}", id);
            }
            log.info(format!("✏️ Recipe updated: {}", id));
            if telemetry::config::json_mode() {
                log.result(&types::RecipeUpdated {
                    id,
                    ingredients: changes.ingredients.as_ref().map(Vec::len),
                    tags: changes.tags,
                })?;
            }
        }
        RecipeSub::Rm { id } => {
            let _s = log.span(&RecipePhase::Remove).entered();
            let removed = db::delete_recipe(pool, group_id, id).await?;
            if removed { log.info("🗑️ Recipe removed"); } else { log.warn(format!("No recipe {} in this group", id)); }
            if telemetry::config::json_mode() {
                log.result(&types::RecipeRemoved { id, removed })?;
            }
        }
    }
    Ok(())
}

/// A blank `--search` lists everything.
fn search_term(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|q| !q.is_empty())
}

/// Turn `recipe edit` flags into stored changes, with the same trimming and filtering as `recipe add`.
pub fn recipe_changes(
    name: Option<String>,
    instructions: Option<String>,
    image_url: Option<String>,
    ingredients: &[String],
    clear_ingredients: bool,
    tags: Option<String>,
) -> Result<db::RecipeChanges> {
    let name = match name.as_deref().map(str::trim) {
        Some("") => bail!("Recipe name is required"),
        other => other.map(str::to_string),
    };
    let ingredients = if !ingredients.is_empty() {
        Some(ingredients.iter().filter_map(|s| parse_ingredient_arg(s)).collect())
    } else if clear_ingredients {
        Some(Vec::new())
    } else {
        None
    };
    let changes = db::RecipeChanges {
        name,
        instructions: instructions.map(|i| i.trim().to_string()),
        image_url: image_url.map(|u| Some(u.trim().to_string()).filter(|u| !u.is_empty())),
        ingredients,
        tags: tags.as_deref().map(parse_tags),
    };
    if changes.is_empty() {
        bail!("Nothing to change; pass --name, --instructions, --image-url, --ingredient or --tags");
    }
    Ok(changes)
}

/// Parse "name|quantity|unit". Missing or blank quantity/unit become None; a blank name yields None.
pub fn parse_ingredient_arg(s: &str) -> Option<NewIngredient> {
    let mut parts = s.splitn(3, '|').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?;
    let quantity = parts.next().filter(|q| !q.is_empty()).map(str::to_string);
    let unit = parts.next().filter(|u| !u.is_empty()).map(str::to_string);
    Some(NewIngredient { name: name.to_string(), quantity, unit })
}

/// Split a comma-separated tag string; blanks dropped, duplicates collapsed in first-seen order.
pub fn parse_tags(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}
