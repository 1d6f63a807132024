//! Session statistics for repeated assessments.

use crate::types::assessment::RiskTier;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collected over one interactive session
pub struct SessionMetrics {
    /// Total assessments completed
    pub assessments: AtomicU64,
    /// Assessments that returned an error
    pub failures: AtomicU64,
    /// Assessments by tier, indexed like `RiskTier::ALL`
    by_tier: [AtomicU64; 3],
    /// Pipeline latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            assessments: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            by_tier: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            latencies: RwLock::new(Vec::with_capacity(64)),
            start_time: Instant::now(),
        }
    }

    fn tier_index(tier: RiskTier) -> usize {
        match tier {
            RiskTier::Low => 0,
            RiskTier::Moderate => 1,
            RiskTier::High => 2,
        }
    }

    /// Record a completed assessment
    pub fn record_assessment(&self, latency: Duration, tier: RiskTier) {
        self.assessments.fetch_add(1, Ordering::Relaxed);
        self.by_tier[Self::tier_index(tier)].fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only the most recent 10000
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }
    }

    /// Record an assessment that failed
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of assessments in a tier
    pub fn tier_count(&self, tier: RiskTier) -> u64 {
        self.by_tier[Self::tier_index(tier)].load(Ordering::Relaxed)
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let latencies = match self.latencies.read() {
            Ok(latencies) => latencies,
            Err(_) => return LatencyStats::default(),
        };
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let total = self.assessments.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();

        info!(
            assessments = total,
            failures = failures,
            elapsed_s = self.start_time.elapsed().as_secs(),
            "Session summary"
        );

        for tier in RiskTier::ALL {
            let count = self.tier_count(tier);
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!(tier = tier.as_str(), count = count, pct = %format!("{:.1}%", pct), "Tier share");
        }

        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                max_us = latency.max_us,
                "Assessment latency"
            );
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}
