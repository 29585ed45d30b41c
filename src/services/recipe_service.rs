use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::api::format::{IngredientAmountView, RecipeView};
use crate::api::origin::RequestOrigin;
use crate::api::validation::{
    check_int, check_text, first_duplicate, FieldErrors, IntInput, MAX_AMOUNT, MAX_COOKING_TIME, MAX_NAME_LENGTH,
    MIN_AMOUNT, MIN_COOKING_TIME, REQUIRED,
};
use crate::database::models::{
    Ingredient, RecipeIngredientRow, RecipeListRow, RecipeRow, RecipeTagRow, Tag,
};
use crate::database::query_builder::QueryBuilder;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{FilterWhere, PageRequest, RecipeFilter, SqlParam};
use crate::services::media::{decode_data_uri, DecodedImage, MediaStorage};

const RECIPE_COLUMNS: &str = "id, author_id, name, image, text, cooking_time, pub_date";
const NOT_ALLOWED: &str = "You do not have permission to perform this action.";

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountInput {
    pub id: Option<IntInput>,
    pub amount: Option<IntInput>,
}

/// Body of `POST /api/recipes/` and `PATCH /api/recipes/{id}/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub ingredients: Option<Vec<IngredientAmountInput>>,
    pub tags: Option<Vec<IntInput>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<IntInput>,
}

/// Recipe fields that passed validation; scalar fields are `None` when a PATCH leaves them untouched
#[derive(Debug)]
pub struct ValidRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<(i64, i32)>,
}

impl RecipeInput {
    /// Checks that need no database access. `partial` relaxes scalar fields for PATCH;
    /// tags and ingredients are always required.
    pub fn check(&self, partial: bool) -> Result<ValidRecipe, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.text_field(&mut errors, "name", self.name.as_deref(), Some(MAX_NAME_LENGTH), partial);
        let text = self.text_field(&mut errors, "text", self.text.as_deref(), None, partial);

        let cooking_time = match &self.cooking_time {
            Some(value) => check_int(&mut errors, "cooking_time", value, MIN_COOKING_TIME, MAX_COOKING_TIME)
                .map(|n| n as i32),
            None if partial => None,
            None => {
                errors.add("cooking_time", REQUIRED);
                None
            }
        };

        let image = match self.image.as_deref() {
            Some(raw) => match decode_data_uri(raw) {
                Ok(image) => Some(image),
                Err(e) => {
                    errors.add("image", e.to_string());
                    None
                }
            },
            None if partial => None,
            None => {
                errors.add("image", REQUIRED);
                None
            }
        };

        let tags = self.check_tags(&mut errors);
        let ingredients = self.check_ingredients(&mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidRecipe {
            name,
            text,
            cooking_time,
            image,
            tags,
            ingredients,
        })
    }

    fn text_field(
        &self,
        errors: &mut FieldErrors,
        field: &str,
        value: Option<&str>,
        max: Option<usize>,
        partial: bool,
    ) -> Option<String> {
        if value.is_none() && partial {
            return None;
        }
        let before = errors.contains(field);
        check_text(errors, field, value, max);
        match (before, errors.contains(field)) {
            (false, false) => value.map(|v| v.trim().to_string()),
            _ => None,
        }
    }

    fn check_tags(&self, errors: &mut FieldErrors) -> Vec<i64> {
        let Some(raw) = &self.tags else {
            errors.add("tags", REQUIRED);
            return vec![];
        };
        if raw.is_empty() {
            errors.add("tags", "At least one tag is required.");
            return vec![];
        }
        let mut tags = Vec::with_capacity(raw.len());
        for value in raw {
            match value.resolve() {
                Some(id) => tags.push(id),
                None => {
                    errors.add("tags", "Tags must be given by numeric id.");
                    return vec![];
                }
            }
        }
        if first_duplicate(tags.iter().copied()).is_some() {
            errors.add("tags", "Tags must not repeat.");
        }
        tags
    }

    fn check_ingredients(&self, errors: &mut FieldErrors) -> Vec<(i64, i32)> {
        let Some(raw) = &self.ingredients else {
            errors.add("ingredients", REQUIRED);
            return vec![];
        };
        if raw.is_empty() {
            errors.add("ingredients", "At least one ingredient is required.");
            return vec![];
        }
        let mut ingredients = Vec::with_capacity(raw.len());
        for item in raw {
            let Some(id) = item.id.as_ref().and_then(IntInput::resolve) else {
                errors.add("ingredients", "Each ingredient needs a numeric id.");
                continue;
            };
            let Some(amount) = &item.amount else {
                errors.add("ingredients", "Each ingredient needs an amount.");
                continue;
            };
            let mut amount_errors = FieldErrors::new();
            match check_int(&mut amount_errors, "ingredients", amount, MIN_AMOUNT, MAX_AMOUNT) {
                Some(amount) => ingredients.push((id, amount as i32)),
                None => errors.merge(amount_errors),
            }
        }
        if first_duplicate(ingredients.iter().map(|(id, _)| *id)).is_some() {
            errors.add("ingredients", "Ingredients must not repeat.");
        }
        ingredients
    }
}

pub struct RecipeService {
    pool: PgPool,
    media: MediaStorage,
}

impl RecipeService {
    pub fn new(pool: PgPool, media: MediaStorage) -> Self {
        Self { pool, media }
    }

    pub async fn list(
        &self,
        viewer: Option<i64>,
        filter: &RecipeFilter,
        page: &PageRequest,
        origin: &RequestOrigin,
    ) -> Result<(Vec<RecipeView>, i64), ApiError> {
        let count = QueryBuilder::new("1", "recipes r")
            .filter(&filter.to_where(viewer, 0))
            .count(&self.pool)
            .await?;
        page.ensure_in_range(count)?;

        let conditions = filter.to_where(viewer, 1);
        let rows: Vec<RecipeListRow> = QueryBuilder::new(RecipeListRow::COLUMNS, RecipeListRow::SOURCE)
            .leading(vec![SqlParam::OptionalInt(viewer)])
            .filter(&conditions)
            .order(RecipeListRow::ORDER_BY)
            .page(page.limit, page.offset())
            .select_all(&self.pool)
            .await?;

        Ok((self.hydrate(rows, origin).await?, count))
    }

    pub async fn get(&self, viewer: Option<i64>, id: i64, origin: &RequestOrigin) -> Result<RecipeView, ApiError> {
        let mut conditions = FilterWhere::new(1);
        conditions.eq("r.id", SqlParam::Int(id));
        let row: Option<RecipeListRow> = QueryBuilder::new(RecipeListRow::COLUMNS, RecipeListRow::SOURCE)
            .leading(vec![SqlParam::OptionalInt(viewer)])
            .filter(&conditions)
            .select_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| ApiError::not_found("Recipe not found."))?;
        self.hydrate(vec![row], origin)
            .await?
            .pop()
            .ok_or_else(|| ApiError::not_found("Recipe not found."))
    }

    pub async fn create(
        &self,
        author_id: i64,
        input: RecipeInput,
        origin: &RequestOrigin,
    ) -> Result<RecipeView, ApiError> {
        let recipe = self.validate(&input, false).await?;
        let image = recipe
            .image
            .as_ref()
            .ok_or_else(|| ApiError::field("image", REQUIRED))?;
        let image_path = self.media.save_recipe_image(image).await?;

        let created = self.insert(author_id, &recipe, &image_path).await;
        let id = match created {
            Ok(id) => id,
            Err(e) => {
                self.media.remove(&image_path).await;
                return Err(e);
            }
        };

        info!("User {} created recipe {}", author_id, id);
        self.get(Some(author_id), id, origin).await
    }

    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        input: RecipeInput,
        origin: &RequestOrigin,
    ) -> Result<RecipeView, ApiError> {
        self.find_owned(user_id, id).await?;
        let recipe = self.validate(&input, true).await?;

        let new_image = match &recipe.image {
            Some(image) => Some(self.media.save_recipe_image(image).await?),
            None => None,
        };

        match self.apply_update(id, &recipe, new_image.as_deref()).await {
            Ok(previous_image) => {
                if new_image.is_some() {
                    self.media.remove(&previous_image).await;
                }
            }
            Err(e) => {
                if let Some(path) = &new_image {
                    self.media.remove(path).await;
                }
                return Err(e);
            }
        }

        info!("User {} updated recipe {}", user_id, id);
        self.get(Some(user_id), id, origin).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), ApiError> {
        self.find_owned(user_id, id).await?;
        let image: Option<String> = sqlx::query_scalar("DELETE FROM recipes WHERE id = $1 RETURNING image")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let image = image.ok_or_else(|| ApiError::not_found("Recipe not found."))?;
        self.media.remove(&image).await;
        info!("User {} deleted recipe {}", user_id, id);
        Ok(())
    }

    /// Recipe row, 404 when missing and 403 unless `user_id` wrote it
    async fn find_owned(&self, user_id: i64, id: i64) -> Result<RecipeRow, ApiError> {
        let sql = format!("SELECT {} FROM recipes WHERE id = $1", RECIPE_COLUMNS);
        let recipe = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Recipe not found."))?;
        if recipe.author_id != user_id {
            return Err(ApiError::forbidden(NOT_ALLOWED));
        }
        Ok(recipe)
    }

    /// Input checks plus existence of the referenced tags and ingredients
    async fn validate(&self, input: &RecipeInput, partial: bool) -> Result<ValidRecipe, ApiError> {
        let (recipe, mut errors) = match input.check(partial) {
            Ok(recipe) => (Some(recipe), FieldErrors::new()),
            Err(errors) => (None, errors),
        };

        if let Some(recipe) = &recipe {
            let missing_tags = Repository::<Tag>::new(self.pool.clone())
                .missing_ids(&recipe.tags)
                .await?;
            for id in missing_tags {
                errors.add("tags", format!("Invalid pk \"{}\" - object does not exist.", id));
            }

            let ingredient_ids: Vec<i64> = recipe.ingredients.iter().map(|(id, _)| *id).collect();
            let missing_ingredients = Repository::<Ingredient>::new(self.pool.clone())
                .missing_ids(&ingredient_ids)
                .await?;
            for id in missing_ingredients {
                errors.add("ingredients", format!("Ingredient {} does not exist.", id));
            }
        }

        match recipe {
            Some(recipe) if errors.is_empty() => Ok(recipe),
            _ => Err(ApiError::validation_error(errors)),
        }
    }

    async fn insert(&self, author_id: i64, recipe: &ValidRecipe, image_path: &str) -> Result<i64, ApiError> {
        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO recipes (author_id, name, image, text, cooking_time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(author_id)
        .bind(recipe.name.as_deref().unwrap_or_default())
        .bind(image_path)
        .bind(recipe.text.as_deref().unwrap_or_default())
        .bind(recipe.cooking_time.unwrap_or(MIN_COOKING_TIME as i32))
        .fetch_one(&mut *tx)
        .await?;

        replace_relations(&mut tx, id, recipe).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Writes the update under a row lock; returns the image path the row held before it
    async fn apply_update(&self, id: i64, recipe: &ValidRecipe, image_path: Option<&str>) -> Result<String, ApiError> {
        let mut tx = self.pool.begin().await?;
        let previous_image: String = sqlx::query_scalar("SELECT image FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Recipe not found."))?;

        sqlx::query(
            "UPDATE recipes SET name = COALESCE($2, name), text = COALESCE($3, text), \
             cooking_time = COALESCE($4, cooking_time), image = COALESCE($5, image) WHERE id = $1",
        )
        .bind(id)
        .bind(recipe.name.as_deref())
        .bind(recipe.text.as_deref())
        .bind(recipe.cooking_time)
        .bind(image_path)
        .execute(&mut *tx)
        .await?;

        replace_relations(&mut tx, id, recipe).await?;
        tx.commit().await?;
        Ok(previous_image)
    }

    /// Attach tags and ingredients to listing rows, two queries for the whole page
    async fn hydrate(&self, rows: Vec<RecipeListRow>, origin: &RequestOrigin) -> Result<Vec<RecipeView>, ApiError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let tag_rows: Vec<RecipeTagRow> = sqlx::query_as(
            "SELECT rt.recipe_id, t.id, t.name, t.color, t.slug \
             FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = ANY($1) ORDER BY t.name, t.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let ingredient_rows: Vec<RecipeIngredientRow> = sqlx::query_as(
            "SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount \
             FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id \
             WHERE ri.recipe_id = ANY($1) ORDER BY ri.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.recipe_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                color: row.color,
                slug: row.slug,
            });
        }

        let mut ingredients: HashMap<i64, Vec<IngredientAmountView>> = HashMap::new();
        for row in ingredient_rows {
            let ingredient = Ingredient {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
            };
            ingredients
                .entry(row.recipe_id)
                .or_default()
                .push(IngredientAmountView::new(ingredient, row.amount));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                RecipeView::new(
                    row,
                    tags.remove(&id).unwrap_or_default(),
                    ingredients.remove(&id).unwrap_or_default(),
                    &self.media,
                    origin,
                )
            })
            .collect())
    }
}

/// Replace a recipe's tag and ingredient sets inside `tx`
async fn replace_relations(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    recipe: &ValidRecipe,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(recipe_id)
        .bind(&recipe.tags)
        .execute(&mut **tx)
        .await?;

    let (ingredient_ids, amounts): (Vec<i64>, Vec<i32>) = recipe.ingredients.iter().copied().unzip();
    sqlx::query(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) \
         SELECT $1, i, a FROM UNNEST($2::BIGINT[], $3::INT[]) AS t (i, a)",
    )
    .bind(recipe_id)
    .bind(&ingredient_ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
