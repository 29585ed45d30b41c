pub mod media;
pub mod recipe_service;
pub mod relation_service;
pub mod shopping_list;
pub mod subscription_service;
pub mod user_service;

pub use media::MediaStorage;
pub use recipe_service::RecipeService;
pub use relation_service::{RecipeList, RelationService};
pub use shopping_list::ShoppingListService;
pub use subscription_service::SubscriptionService;
pub use user_service::UserService;
