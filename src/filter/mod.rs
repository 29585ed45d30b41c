pub mod types;
pub mod error;
pub mod filter_where;
pub mod query;
pub mod pagination;
pub mod recipe;
pub mod ingredient;
pub mod user;

pub use types::*;
pub use error::FilterError;
pub use filter_where::FilterWhere;
pub use query::QueryParams;
pub use pagination::{PageRequest, Paginated};
pub use recipe::RecipeFilter;
pub use ingredient::IngredientFilter;
pub use user::UserFilter;
