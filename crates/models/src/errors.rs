use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),
}

/// Browser-style `required` check: only the empty string is rejected.
pub fn require(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.is_empty() {
        return Err(ModelError::MissingField(field));
    }
    Ok(())
}
