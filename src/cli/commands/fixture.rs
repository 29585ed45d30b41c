use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::api::validation::{validate_color, validate_slug};
use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load tags or ingredients from a JSON or YAML file, skipping existing rows")]
    Load {
        #[arg(help = "Fixture file (.json, .yaml or .yml)")]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

/// Fixture file contents: `{"kind": "tags" | "ingredients", "items": [...]}`
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum Fixture {
    Tags(Vec<TagFixture>),
    Ingredients(Vec<IngredientFixture>),
}

impl Fixture {
    fn kind(&self) -> &'static str {
        match self {
            Fixture::Tags(_) => "tags",
            Fixture::Ingredients(_) => "ingredients",
        }
    }

    fn len(&self) -> usize {
        match self {
            Fixture::Tags(items) => items.len(),
            Fixture::Ingredients(items) => items.len(),
        }
    }

    /// Every item must be complete before anything is written
    fn check(&self) -> anyhow::Result<()> {
        match self {
            Fixture::Tags(items) => {
                for (index, tag) in items.iter().enumerate() {
                    if tag.name.trim().is_empty() {
                        anyhow::bail!("tag #{}: name is empty", index);
                    }
                    validate_color(&tag.color).map_err(|e| anyhow::anyhow!("tag #{}: {}", index, e))?;
                    validate_slug(&tag.slug).map_err(|e| anyhow::anyhow!("tag #{}: {}", index, e))?;
                }
            }
            Fixture::Ingredients(items) => {
                for (index, ingredient) in items.iter().enumerate() {
                    if ingredient.name.trim().is_empty() || ingredient.measurement_unit.trim().is_empty() {
                        anyhow::bail!("ingredient #{}: name and measurement_unit are required", index);
                    }
                }
            }
        }
        Ok(())
    }
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load { file } => handle_load(&file, output_format).await,
    }
}

async fn handle_load(file: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let fixture = read_fixture(file)?;
    fixture.check()?;

    let pool = connect().await?;
    let inserted = load(&pool, &fixture).await?;
    let skipped = fixture.len() as u64 - inserted;

    tracing::info!("Loaded {} fixture from {}: {} inserted, {} skipped", fixture.kind(), file.display(), inserted, skipped);
    output_success(
        output_format,
        &format!("Loaded {} {} ({} already present)", inserted, fixture.kind(), skipped),
        Some(json!({
            "kind": fixture.kind(),
            "inserted": inserted,
            "skipped": skipped,
        })),
    )
}

fn read_fixture(file: &Path) -> anyhow::Result<Fixture> {
    let raw = fs::read_to_string(file).with_context(|| format!("Cannot read {}", file.display()))?;
    parse_fixture(&raw, file).with_context(|| format!("Invalid fixture file {}", file.display()))
}

fn parse_fixture(raw: &str, file: &Path) -> anyhow::Result<Fixture> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(raw)?),
        _ => Ok(serde_json::from_str(raw)?),
    }
}

/// Inserts all items in one transaction; returns how many rows were new
async fn load(pool: &PgPool, fixture: &Fixture) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    match fixture {
        Fixture::Tags(items) => {
            for tag in items {
                inserted += sqlx::query(
                    "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
                )
                .bind(tag.name.trim())
                .bind(&tag.color)
                .bind(&tag.slug)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            }
        }
        Fixture::Ingredients(items) => {
            for ingredient in items {
                inserted += sqlx::query(
                    "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(ingredient.name.trim())
                .bind(ingredient.measurement_unit.trim())
                .execute(&mut *tx)
                .await?
                .rows_affected();
            }
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_ingredients_parse() {
        let raw = r#"{"kind": "ingredients", "items": [{"name": "flour", "measurement_unit": "g"}]}"#;
        let fixture = parse_fixture(raw, Path::new("data/ingredients.json")).unwrap();
        assert_eq!(fixture.kind(), "ingredients");
        assert_eq!(fixture.len(), 1);
        assert!(fixture.check().is_ok());
    }

    #[test]
    fn yaml_tags_parse() {
        let raw = "kind: tags\nitems:\n  - name: Breakfast\n    color: \"#E26C2D\"\n    slug: breakfast\n";
        let fixture = parse_fixture(raw, Path::new("tags.YML")).unwrap();
        match &fixture {
            Fixture::Tags(tags) => assert_eq!(tags[0].slug, "breakfast"),
            other => panic!("unexpected fixture {:?}", other),
        }
        assert!(fixture.check().is_ok());
    }

    #[test]
    fn bundled_fixtures_are_valid() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        for name in ["ingredients.json", "tags.yaml"] {
            let fixture = read_fixture(&root.join(name)).unwrap();
            fixture.check().unwrap();
            assert!(fixture.len() > 0, "{}", name);
        }
    }

    #[test]
    fn bad_tag_color_is_rejected() {
        let raw = r#"{"kind": "tags", "items": [{"name": "Lunch", "color": "green", "slug": "lunch"}]}"#;
        let fixture = parse_fixture(raw, Path::new("tags.json")).unwrap();
        assert!(fixture.check().is_err());
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let raw = r#"{"kind": "recipes", "items": []}"#;
        assert!(parse_fixture(raw, Path::new("x.json")).is_err());
    }
}
