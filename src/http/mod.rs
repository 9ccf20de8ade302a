//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, pipeline)
//!     → request.rs (request ID)
//!     → [security checks, routing lookup]
//!     → forward to upstream
//!     → response.rs (synthesized errors when the upstream fails)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
