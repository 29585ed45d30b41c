// handlers/mod.rs - Two-tier handler layout
//
// Public (anonymous callers allowed) → Protected (token required).
// Authentication itself runs as router middleware; the tier decides which
// extractor a handler takes: `MaybeAuthUser` or `AuthUser`.
pub mod public;
pub mod protected;
