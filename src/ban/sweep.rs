//! Periodic eviction of lapsed bans.
//!
//! Request handling only prunes addresses that show up in traffic. The
//! sweeper bounds the table for addresses that never come back.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;

use crate::ban::table::BanTable;
use crate::config::SweepConfig;
use crate::observability::metrics;

pub struct Sweeper {
    table: BanTable,
    config: SweepConfig,
}

impl Sweeper {
    pub fn new(table: BanTable, config: SweepConfig) -> Self {
        Self { table, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled || self.config.interval_secs == 0 {
            tracing::info!("Ban sweeper disabled");
            return;
        }

        tracing::info!(interval = self.config.interval_secs, "Ban sweeper starting");

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Ban sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a single sweep against the current time.
    pub fn sweep_once(&self) -> usize {
        let evicted = self.table.sweep_at(Utc::now());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.table.len(), "Swept lapsed bans");
            metrics::record_eviction("sweep", evicted as u64);
        }
        metrics::record_table_size(self.table.len());
        evicted
    }
}
