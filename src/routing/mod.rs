//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! request path
//!     → matcher.rs (prefix match, segment-boundary aware)
//!     → router.rs (table lookup, first match wins)
//!     → rewrite (gateway prefix → upstream prefix)
//!     → forward to the upstream service
//! ```
//!
//! # Design Decisions
//! - The table is built once from configuration and never mutated
//! - Each entry declares its own limiter and auth requirements so the
//!   pipeline has no per-service special cases

pub mod matcher;
pub mod router;

pub use router::{LimiterClass, RouteTable, ServiceRoute};
