//! Cached fleet reporting: repository → scores → statistics.
//!
//! Every entry point goes through the [`ResultCache`], so repeated calls
//! within a TTL window reuse the previous load and aggregation.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{Clock, ResultCache, SystemClock};
use crate::config::RaterConfig;
use crate::fleet::{self, types::FleetStatistics, types::FleetSummary, types::VehicleReport};
use crate::metrics::{MetricRecord, VehicleClass};
use crate::repository;
use crate::scoring::{self, ScoreResult};

pub const DATASET_KEY: &str = "fleet-dataset";
pub const SCORES_KEY: &str = "fleet-scores";
pub const SUMMARY_KEY: &str = "fleet-summary";

/// Cache key for the statistics of one class filter.
pub fn statistics_key(class: Option<VehicleClass>) -> String {
    format!(
        "statistics:class={}",
        class.map_or("all", VehicleClass::as_str)
    )
}

/// Where registry exports are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    /// Every export file directly inside a directory, in file-name order.
    Directory(PathBuf),
    /// An explicit list, merged in the given order.
    Files(Vec<PathBuf>),
}

impl DatasetSource {
    fn paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Directory(dir) => match repository::export_files(dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!(error = %e, "Dataset directory unreadable, treating as empty");
                    Vec::new()
                }
            },
            Self::Files(files) => files.clone(),
        }
    }
}

pub struct FleetReport<C: Clock = SystemClock> {
    config: RaterConfig,
    source: DatasetSource,
    cache: ResultCache<C>,
}

impl FleetReport<SystemClock> {
    pub fn new(config: RaterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> FleetReport<C> {
    /// Reads from `config.dataset_dir`, timing entries with `clock`.
    pub fn with_clock(config: RaterConfig, clock: C) -> Self {
        let source = DatasetSource::Directory(config.dataset_dir.clone());
        Self {
            config,
            source,
            cache: ResultCache::with_clock(clock),
        }
    }

    pub fn with_source(mut self, source: DatasetSource) -> Self {
        self.source = source;
        self.cache.clear();
        self
    }

    pub fn config(&self) -> &RaterConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache<C> {
        &self.cache
    }

    /// The merged, deduplicated fleet.
    #[tracing::instrument(skip(self))]
    pub fn dataset(&self) -> Arc<Vec<MetricRecord>> {
        self.cache
            .get_or_compute(DATASET_KEY, self.config.dataset_ttl, || {
                repository::load_paths(&self.source.paths())
            })
    }

    /// Every vehicle scored as of the cache clock's current time.
    #[tracing::instrument(skip(self))]
    pub fn scores(&self) -> Arc<Vec<ScoreResult>> {
        self.cache
            .get_or_compute(SCORES_KEY, self.config.dataset_ttl, || {
                let records = self.dataset();
                let at = self.cache.clock().now();
                let results: Vec<ScoreResult> =
                    records.iter().map(|r| scoring::score(r, at)).collect();
                info!(vehicles = results.len(), evaluated_at = %at, "Fleet scored");
                results
            })
    }

    /// Fleet statistics, optionally restricted to one class. `None` inside
    /// the `Arc` means no vehicle matched.
    #[tracing::instrument(skip(self))]
    pub fn statistics(&self, class: Option<VehicleClass>) -> Arc<Option<FleetStatistics>> {
        let key = statistics_key(class);
        self.cache
            .get_or_compute(&key, self.config.statistics_ttl, || {
                let stats = fleet::aggregate(&self.scores(), class);
                if stats.is_none() {
                    debug!(key = %key, "No vehicles for statistics");
                }
                stats
            })
    }

    #[tracing::instrument(skip(self))]
    pub fn summary(&self) -> Arc<FleetSummary> {
        self.cache
            .get_or_compute(SUMMARY_KEY, self.config.summary_ttl, || {
                fleet::summary(&self.scores())
            })
    }

    /// Per-vehicle comparison against the cached fleet.
    #[tracing::instrument(skip(self))]
    pub fn vehicle(&self, vehicle_id: &str) -> Option<VehicleReport> {
        fleet::vehicle_report(&self.scores(), vehicle_id)
    }
}
