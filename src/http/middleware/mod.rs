pub mod ban_filter;

pub use ban_filter::{BanFilter, BanFilterLayer, BanFilterService, Verdict};
