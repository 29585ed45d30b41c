pub mod format;
pub mod origin;
pub mod validation;
