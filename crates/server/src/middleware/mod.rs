//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first, as applied in `main`)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is done per handler with the extractors in [`auth`].

pub mod auth;
pub mod session;

pub use auth::{AdminSource, RequireAdmin, Viewer};
pub use session::create_session_layer;
