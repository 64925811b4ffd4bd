//! Ban gate: HTTP middleware that turns away clients under a time-bounded ban.

pub mod ban;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use ban::{BanStatus, BanTable};
pub use config::schema::GateConfig;
pub use http::{BanFilterLayer, HttpServer};
pub use lifecycle::Shutdown;
