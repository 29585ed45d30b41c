// Response shapes for the Foodgram API
use serde::Serialize;

use crate::api::origin::RequestOrigin;
use crate::database::models::{Ingredient, RecipeListRow, RecipeMiniRow, Tag, User};
use crate::services::media::MediaStorage;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// Registration response: the profile without viewer-relative fields
#[derive(Debug, Clone, Serialize)]
pub struct UserCreatedView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserCreatedView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngredientAmountView {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl IngredientAmountView {
    pub fn new(ingredient: Ingredient, amount: i32) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmountView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    pub fn new(
        row: RecipeListRow,
        tags: Vec<Tag>,
        ingredients: Vec<IngredientAmountView>,
        media: &MediaStorage,
        origin: &RequestOrigin,
    ) -> Self {
        let author = UserView {
            email: row.author_email,
            id: row.author_id,
            username: row.author_username,
            first_name: row.author_first_name,
            last_name: row.author_last_name,
            is_subscribed: row.author_is_subscribed,
        };

        Self {
            id: row.id,
            tags,
            author,
            ingredients,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: row.name,
            image: media.url(origin, &row.image),
            text: row.text,
            cooking_time: row.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeMiniView {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeMiniView {
    pub fn new(row: RecipeMiniRow, media: &MediaStorage, origin: &RequestOrigin) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: media.url(origin, &row.image),
            cooking_time: row.cooking_time,
        }
    }
}

/// A followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeMiniView>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    pub auth_token: String,
}
