//! API gateway for the diabetes self-management platform.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 API GATEWAY                   │
//!                      │                                               │
//!   Client Request     │  ┌──────────┐   ┌───────────┐   ┌─────────┐  │
//!   ──────────────────▶│  │ security │──▶│   rate    │──▶│  auth   │  │
//!                      │  │ headers  │   │ limiters  │   │ check   │  │
//!                      │  └──────────┘   └───────────┘   └────┬────┘  │
//!                      │                                      │       │
//!                      │                                      ▼       │
//!   Client Response    │  ┌──────────┐                 ┌──────────┐   │     Downstream
//!   ◀──────────────────┼──│ response │◀────────────────│ routing  │◀──┼──── services
//!                      │  │  relay   │                 │ + rewrite│   │     (auth, food,
//!                      │  └──────────┘                 └──────────┘   │      meals, ...)
//!                      │                                               │
//!                      │  Cross-cutting: config, observability,        │
//!                      │  lifecycle (signals, graceful shutdown)       │
//!                      └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
