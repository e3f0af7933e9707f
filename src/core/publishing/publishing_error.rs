use thiserror::Error;

use crate::core::documents::StoreError;

/// Everything a publishing workflow can fail with.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A required field was missing or blank. Nothing was sent to the platform.
    #[error("{0}")]
    Validation(String),

    /// The service is missing configuration it needs for this request.
    #[error("{0}")]
    Config(String),

    #[error("Cannot access document {id}. Check permissions and make sure the document exists.")]
    Access { id: String },

    #[error(transparent)]
    Platform(#[from] StoreError),
}

impl PublishError {
    /// Turn a platform access failure into a permissions error naming `doc_id`.
    /// Every other error is returned unchanged.
    pub fn classify(self, doc_id: &str) -> Self {
        match self {
            PublishError::Platform(err) if err.is_access_failure() => PublishError::Access {
                id: doc_id.to_string(),
            },
            other => other,
        }
    }
}

/// Returns the trimmed value, or a validation error naming the field.
pub fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, PublishError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PublishError::Validation(format!("{} is required", field))),
    }
}

/// Like [`require`], but also rejects anything that isn't a platform file ID.
/// IDs end up in request paths, so only `[A-Za-z0-9_-]` is allowed.
pub fn require_id<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, PublishError> {
    let id = require(value, field)?;
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(id)
    } else {
        Err(PublishError::Validation(format!(
            "{} contains invalid characters",
            field
        )))
    }
}
