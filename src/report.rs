use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::poller::PollOutcome;
use crate::prober::classify;
use crate::state::DistributionOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTier {
    Perfect,
    Excellent,
    Good,
    NeedsAttention,
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTier::Perfect => write!(f, "PERFECT"),
            StatusTier::Excellent => write!(f, "EXCELLENT"),
            StatusTier::Good => write!(f, "GOOD"),
            StatusTier::NeedsAttention => write!(f, "NEEDS_ATTENTION"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LbStatus {
    Working,
    Partial,
    NotWorking,
}

impl fmt::Display for LbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LbStatus::Working => write!(f, "WORKING"),
            LbStatus::Partial => write!(f, "PARTIAL"),
            LbStatus::NotWorking => write!(f, "NOT_WORKING"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemReport {
    pub healthy_count: usize,
    pub total: usize,
    pub health_percentage: f64,
    pub status_tier: StatusTier,
    pub lb_status: LbStatus,
    pub distinct_instances: usize,
    pub failed_trials: u32,
    pub attempts: u32,
    pub converged: bool,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub success: bool,
}

impl SystemReport {
    pub fn build(
        poll: &PollOutcome,
        distribution: &DistributionOutcome,
        elapsed: Duration,
    ) -> Self {
        let healthy_count = poll.healthy_count();
        let total = poll.total();
        let status_tier = status_tier(healthy_count, total);
        let lb_status = classify(distribution);

        Self {
            healthy_count,
            total,
            health_percentage: health_percentage(healthy_count, total),
            status_tier,
            lb_status,
            distinct_instances: distribution.distinct_instances.len(),
            failed_trials: distribution.failed_count,
            attempts: poll.attempts,
            converged: poll.converged,
            elapsed,
            success: status_tier == StatusTier::Perfect && lb_status == LbStatus::Working,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

pub fn health_percentage(healthy_count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(healthy_count as f64 / total as f64 * 100.0, 1)
}

/// First matching threshold wins. An empty target set verifies nothing.
pub fn status_tier(healthy_count: usize, total: usize) -> StatusTier {
    if total == 0 {
        return StatusTier::NeedsAttention;
    }
    if healthy_count == total {
        StatusTier::Perfect
    } else if healthy_count * 10 >= total * 9 {
        StatusTier::Excellent
    } else if healthy_count * 10 >= total * 8 {
        StatusTier::Good
    } else {
        StatusTier::NeedsAttention
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(value.as_secs_f64(), 2))
}
