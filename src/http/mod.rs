//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → middleware/ban_filter.rs (X-Forwarded-For vs ban table)
//!         → 403 on active ban or missing header
//!     → server.rs forward handler (send to upstream)
//!     → upstream response returned unaltered
//! ```

pub mod forwarded;
pub mod middleware;
pub mod server;

pub use middleware::{BanFilter, BanFilterLayer, BanFilterService, Verdict};
pub use server::HttpServer;
