// handlers/protected/auth/mod.rs - Session management for authenticated callers
pub mod session; // POST /api/auth/token/logout/

pub use session::logout_post;
