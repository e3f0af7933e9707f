// In-memory platform used by `DOCS_BACKEND=memory` and the tests.

pub mod html_blocks;
pub mod in_memory_workspace;

pub use in_memory_workspace::InMemoryWorkspace;
