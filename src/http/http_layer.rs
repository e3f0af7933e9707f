// The HTTP adapter: JSON in, service call, JSON out.
// Every response is a 200 with a `success` flag, errors included.

#[path = "dtos.rs"]
pub mod dtos;
#[path = "handlers.rs"]
pub mod handlers;
#[path = "router.rs"]
pub mod router;

pub use router::{build_router, AppState};
