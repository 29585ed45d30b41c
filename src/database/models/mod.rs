pub mod user;
pub mod tag;
pub mod ingredient;
pub mod recipe;

pub use user::{User, UserRow};
pub use tag::Tag;
pub use ingredient::Ingredient;
pub use recipe::{RecipeIngredientRow, RecipeListRow, RecipeMiniRow, RecipeRow, RecipeTagRow};
