// The core module contains all business logic.
// Nothing in here talks to Google or HTTP directly; it works against the
// store traits, and infra supplies the implementations.

#[path = "documents/document_models.rs"]
pub mod documents;

#[path = "files/file_models.rs"]
pub mod files;

#[path = "publishing/mod.rs"]
pub mod publishing;
