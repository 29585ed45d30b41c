// handlers/public/auth/mod.rs - Token acquisition
pub mod login; // POST /api/auth/token/login/

pub use login::login_post;
