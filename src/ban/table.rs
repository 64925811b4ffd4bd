//! Live ban table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::ban::entry::BanStatus;
use crate::config::BanFilterConfig;

/// Thread-safe table of address -> RFC3339 expiry.
///
/// Cloning is cheap and every clone shares the same entries. Each lookup
/// holds the key's shard lock for the whole read, parse and evict step, so
/// concurrent requests never observe a half-evaluated entry.
#[derive(Clone, Debug, Default)]
pub struct BanTable {
    inner: Arc<DashMap<String, String>>,
}

impl BanTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the configured bans into a fresh table. The config is not shared.
    pub fn from_config(config: &BanFilterConfig) -> Self {
        config.bans.clone().into_iter().collect()
    }

    /// Evaluate `addr` against the current time.
    pub fn evaluate(&self, addr: &str) -> BanStatus {
        self.evaluate_at(addr, Utc::now())
    }

    /// Evaluate `addr` against `now`, evicting the entry if it lapsed or
    /// does not parse.
    pub fn evaluate_at(&self, addr: &str, now: DateTime<Utc>) -> BanStatus {
        let mut status = BanStatus::Absent;
        self.inner.remove_if(addr, |_, raw| {
            status = BanStatus::classify(raw, now);
            status.is_evicted()
        });
        status
    }

    /// Evict every lapsed or malformed entry. Returns how many were removed.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        // Requests may evict concurrently; only count what this pass removes.
        let mut evicted = 0;
        self.inner.retain(|_, raw| {
            let keep = BanStatus::classify(raw, now).is_active();
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.inner.contains_key(addr)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

impl FromIterator<(String, String)> for BanTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: Arc::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SecondsFormat};

    fn stamp(t: DateTime<Utc>) -> String {
        t.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn table(entries: &[(&str, String)]) -> BanTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_absent() {
        let bans = BanTable::new();
        assert_eq!(bans.evaluate("1.2.3.4"), BanStatus::Absent);
        assert!(bans.is_empty());
    }

    #[test]
    fn test_active_entry_is_kept() {
        let now = Utc::now();
        let bans = table(&[("1.2.3.4", stamp(now + Duration::minutes(5)))]);

        assert!(bans.evaluate_at("1.2.3.4", now).is_active());
        assert!(bans.evaluate_at("1.2.3.4", now).is_active());
        assert!(bans.contains("1.2.3.4"));
    }

    #[test]
    fn test_lapsed_entry_is_evicted_once() {
        let now = Utc::now();
        let bans = table(&[("1.2.3.4", stamp(now - Duration::minutes(5)))]);

        assert!(matches!(
            bans.evaluate_at("1.2.3.4", now),
            BanStatus::Lapsed { .. }
        ));
        assert!(!bans.contains("1.2.3.4"));
        assert_eq!(bans.evaluate_at("1.2.3.4", now), BanStatus::Absent);
    }

    #[test]
    fn test_malformed_entry_is_evicted() {
        let bans = table(&[("9.9.9.9", "not-a-timestamp".to_string())]);

        assert_eq!(
            bans.evaluate("9.9.9.9"),
            BanStatus::Malformed {
                raw: "not-a-timestamp".into()
            }
        );
        assert!(bans.is_empty());
    }

    #[test]
    fn test_entry_expires_between_evaluations() {
        let now = Utc::now();
        let expiry = now + Duration::seconds(30);
        let bans = table(&[("1.2.3.4", stamp(expiry))]);

        assert!(bans.evaluate_at("1.2.3.4", now).is_active());
        assert!(bans
            .evaluate_at("1.2.3.4", expiry + Duration::seconds(1))
            .is_evicted());
        assert!(bans.is_empty());
    }

    #[test]
    fn test_from_config_copies_bans() {
        let mut config = BanFilterConfig::default();
        config
            .bans
            .insert("9.9.9.9".into(), "not-a-timestamp".into());

        let bans = BanTable::from_config(&config);
        bans.evaluate("9.9.9.9");

        assert!(bans.is_empty());
        assert!(config.bans.contains_key("9.9.9.9"));
    }

    #[test]
    fn test_clones_share_entries() {
        let bans = table(&[("9.9.9.9", "junk".to_string())]);
        let other = bans.clone();
        other.evaluate("9.9.9.9");
        assert!(!bans.contains("9.9.9.9"));
    }

    #[test]
    fn test_sweep() {
        let now = Utc::now();
        let bans = table(&[
            ("1.1.1.1", stamp(now + Duration::hours(1))),
            ("2.2.2.2", stamp(now - Duration::hours(1))),
            ("3.3.3.3", "garbage".to_string()),
        ]);

        assert_eq!(bans.sweep_at(now), 2);
        assert_eq!(bans.snapshot().keys().collect::<Vec<_>>(), vec!["1.1.1.1"]);
        assert_eq!(bans.sweep_at(now), 0);
    }

    #[test]
    fn test_sweep_counts_only_its_own_evictions() {
        let now = Utc::now();
        let bans: BanTable = (0..256)
            .map(|i| (format!("10.1.0.{i}"), stamp(now - Duration::hours(1))))
            .collect();

        let request_side = {
            let bans = bans.clone();
            std::thread::spawn(move || {
                (0..256)
                    .filter(|i| bans.evaluate_at(&format!("10.1.0.{i}"), now).is_evicted())
                    .count()
            })
        };
        let swept = bans.sweep_at(now);
        let evicted_by_requests = request_side.join().unwrap();

        assert_eq!(swept + evicted_by_requests, 256);
        assert!(bans.is_empty());
    }

    #[test]
    fn test_concurrent_evaluation() {
        let now = Utc::now();
        let entries: Vec<(String, String)> = (0..64)
            .map(|i| {
                let expiry = if i % 2 == 0 {
                    now + Duration::hours(1)
                } else {
                    now - Duration::hours(1)
                };
                (format!("10.0.0.{i}"), stamp(expiry))
            })
            .collect();
        let bans: BanTable = entries.into_iter().collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bans = bans.clone();
                std::thread::spawn(move || {
                    for i in 0..64 {
                        bans.evaluate_at(&format!("10.0.0.{i}"), now);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(bans.len(), 32);
        assert!(bans.snapshot().keys().all(|k| {
            let last: u32 = k.rsplit('.').next().unwrap().parse().unwrap();
            last % 2 == 0
        }));
    }
}
