//! Ban state subsystem.
//!
//! # Data Flow
//! ```text
//! BanFilterConfig.bans (cloned once)
//!     → table.rs (live, shared BanTable)
//!     → entry.rs (parse RFC3339 expiry, classify active/lapsed/malformed)
//!     → lapsed & malformed entries evicted on lookup
//!     → sweep.rs (optional periodic eviction)
//! ```

pub mod entry;
pub mod sweep;
pub mod table;

pub use entry::BanStatus;
pub use sweep::Sweeper;
pub use table::BanTable;
