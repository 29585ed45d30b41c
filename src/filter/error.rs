use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Invalid page.")]
    InvalidPage,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}
