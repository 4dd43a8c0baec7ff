//! Configuration for the reclaimer.
//!
//! Every field has a default matching a stock handset tuning. The scheduler
//! reads one snapshot per round, so a config swapped mid-scan only affects
//! the next round.
//!
//! # Example
//!
//! ```
//! use lowmem_reclaim::ReclaimConfig;
//!
//! // Minimal config (uses defaults)
//! let config = ReclaimConfig::default();
//! assert_eq!(config.adj, vec![0, 1, 6, 12]);
//! assert_eq!(config.minfree, vec![1536, 2048, 4096, 16384]);
//!
//! // Adaptive tuning
//! let config = ReclaimConfig {
//!     adaptive_enabled: true,
//!     file_min_floor: 81_250,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::batch::BatchPolicy;
use crate::selector::ExemptionList;
use crate::tiers::{TierTable, MAX_TIERS, SCORE_ADJ_MAX};

/// Highest value of the legacy `oom_adj` scale.
pub const OOM_ADJUST_MAX: i32 = 15;

/// Magnitude of the legacy `oom_adj` "disable" value (-17).
pub const OOM_DISABLE: i32 = 17;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tier table is empty")]
    EmptyTiers,
    #[error("too many tier entries: {0} (max {MAX_TIERS})")]
    TooManyTiers(usize),
    #[error("minfree must ascend: entry {index} ({value}) <= previous ({previous})")]
    MinfreeNotAscending { index: usize, value: u64, previous: u64 },
    #[error("exemption discount {discount} exceeds its threshold {threshold}")]
    DiscountTooLarge { discount: i32, threshold: i32 },
    #[error("batch counts must be non-zero when batching is enabled")]
    ZeroBatchCount,
    #[error("invalid list value '{value}': {reason}")]
    Parse { value: String, reason: String },
}

/// Configuration for the reclaimer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReclaimConfig {
    /// Priority cutoff per tier (`adj` module parameter)
    #[serde(default = "default_adj")]
    pub adj: Vec<i32>,

    /// Free-page floor per tier, ascending (`minfree` module parameter)
    #[serde(default = "default_minfree")]
    pub minfree: Vec<u64>,

    /// Adaptive escalation from the pressure signal
    #[serde(default)]
    pub adaptive_enabled: bool,

    /// Cutoff applied when an escalation is consumed
    #[serde(default = "default_escalation_limit")]
    pub escalation_limit: i32,

    /// File-page floor for escalation under moderate (90-94) pressure.
    /// Usually a pseudo-minfree above the highest `minfree` entry.
    #[serde(default)]
    pub file_min_floor: u64,

    /// Minimum time between kills
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Soft-protected process names
    #[serde(default = "default_exemptions")]
    pub exemptions: Vec<String>,
    #[serde(default = "default_exemption_discount")]
    pub exemption_discount: i32,
    #[serde(default = "default_exemption_min_score")]
    pub exemption_min_score: i32,

    /// Multi-victim batching
    #[serde(default)]
    pub batch: BatchPolicy,

    /// Severe pressure samples per window before a rate anomaly is reported
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: u32,
    #[serde(default = "default_anomaly_window_ms")]
    pub anomaly_window_ms: u64,

    /// Verbosity of kill diagnostics (>= 2 requests memory dumps for score-0 kills)
    #[serde(default = "default_debug_level")]
    pub debug_level: u32,
}

fn default_adj() -> Vec<i32> { vec![0, 1, 6, 12] }
fn default_minfree() -> Vec<u64> { vec![3 * 512, 2 * 1024, 4 * 1024, 16 * 1024] } // 6/8/16/64 MB
fn default_escalation_limit() -> i32 { 353 }
fn default_cooldown_ms() -> u64 { 1000 }
fn default_exemptions() -> Vec<String> { vec!["lowmeminfo".into(), "vold".into()] }
fn default_exemption_discount() -> i32 { 100 }
fn default_exemption_min_score() -> i32 { 100 }
fn default_anomaly_threshold() -> u32 { 20 }
fn default_anomaly_window_ms() -> u64 { 30_000 }
fn default_debug_level() -> u32 { 1 }

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            adj: default_adj(),
            minfree: default_minfree(),
            adaptive_enabled: false,
            escalation_limit: default_escalation_limit(),
            file_min_floor: 0,
            cooldown_ms: default_cooldown_ms(),
            exemptions: default_exemptions(),
            exemption_discount: default_exemption_discount(),
            exemption_min_score: default_exemption_min_score(),
            batch: BatchPolicy::default(),
            anomaly_threshold: default_anomaly_threshold(),
            anomaly_window_ms: default_anomaly_window_ms(),
            debug_level: default_debug_level(),
        }
    }
}

impl ReclaimConfig {
    /// Tier table with mismatched lengths clamped.
    #[must_use]
    pub fn tier_table(&self) -> TierTable {
        TierTable::new(&self.adj, &self.minfree)
    }

    #[must_use]
    pub fn exemption_list(&self) -> ExemptionList {
        ExemptionList::new(
            self.exemptions.iter().cloned(),
            self.exemption_discount,
            self.exemption_min_score,
        )
    }

    /// Cooldown applied after a kill. Batching replaces the base interval.
    #[must_use]
    pub fn kill_interval(&self) -> Duration {
        if self.batch.enabled {
            self.batch.interval()
        } else {
            Duration::from_millis(self.cooldown_ms)
        }
    }

    #[must_use]
    pub fn anomaly_window(&self) -> Duration {
        Duration::from_millis(self.anomaly_window_ms)
    }

    /// Reject configurations the scheduler cannot use.
    ///
    /// A length mismatch between `adj` and `minfree` is not an error; the
    /// tier table clamps it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adj.is_empty() || self.minfree.is_empty() {
            return Err(ConfigError::EmptyTiers);
        }
        let longest = self.adj.len().max(self.minfree.len());
        if longest > MAX_TIERS {
            return Err(ConfigError::TooManyTiers(longest));
        }
        for (index, pair) in self.minfree.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(ConfigError::MinfreeNotAscending {
                    index: index + 1,
                    value: pair[1],
                    previous: pair[0],
                });
            }
        }
        if self.exemption_discount > self.exemption_min_score {
            return Err(ConfigError::DiscountTooLarge {
                discount: self.exemption_discount,
                threshold: self.exemption_min_score,
            });
        }
        if self.batch.enabled && (self.batch.high_count == 0 || self.batch.low_count == 0) {
            return Err(ConfigError::ZeroBatchCount);
        }
        Ok(())
    }
}

fn parse_list<T: std::str::FromStr>(value: &str) -> Result<Vec<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let items: Vec<T> = value
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>().map_err(|e| ConfigError::Parse {
                value: s.to_string(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<_, _>>()?;

    if items.len() > MAX_TIERS {
        return Err(ConfigError::TooManyTiers(items.len()));
    }
    Ok(items)
}

/// Parse an `adj` parameter string such as `"0,1,6,12"`.
///
/// Legacy `oom_adj` values are converted to the score scale, see
/// [`autodetect_legacy_adj`].
pub fn parse_adj_list(value: &str) -> Result<Vec<i32>, ConfigError> {
    let mut adj = parse_list::<i32>(value)?;
    autodetect_legacy_adj(&mut adj);
    Ok(adj)
}

/// Parse a `minfree` parameter string such as `"1536,2048,4096,16384"`.
pub fn parse_minfree_list(value: &str) -> Result<Vec<u64>, ConfigError> {
    parse_list::<u64>(value)
}

fn legacy_adj_to_score(oom_adj: i32) -> i32 {
    if oom_adj == OOM_ADJUST_MAX {
        SCORE_ADJ_MAX
    } else {
        oom_adj.saturating_mul(SCORE_ADJ_MAX) / OOM_DISABLE
    }
}

/// Convert a table written in the legacy `oom_adj` scale (-17..15).
///
/// Detection looks at the last entry only: if it fits the legacy range and
/// converts to something outside it, the whole table is converted.
/// Returns whether a conversion happened.
pub fn autodetect_legacy_adj(adj: &mut [i32]) -> bool {
    let Some(&last) = adj.last() else {
        return false;
    };
    if last > OOM_ADJUST_MAX || legacy_adj_to_score(last) <= OOM_ADJUST_MAX {
        return false;
    }

    info!("Converting oom_adj table to score scale");
    for value in adj.iter_mut() {
        let converted = legacy_adj_to_score(*value);
        info!(oom_adj = *value, score = converted, "oom_adj converted");
        *value = converted;
    }
    true
}
