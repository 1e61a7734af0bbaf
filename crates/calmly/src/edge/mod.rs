//! Edge proxy tier.
//!
//! Stateless handlers that authenticate callers, forward requests to the
//! backend unchanged, relay success bodies verbatim and map every failure
//! into the uniform `{ "error": message }` envelope. The proxy never
//! persists anything.

mod credentials;
mod handlers;
mod routes;
mod state;

pub use credentials::CredentialSource;
pub use routes::create_edge_router;
pub use state::EdgeState;
