use std::net::Ipv4Addr;

use serde::Serialize;

use crate::firmware::power::{PowerRails, PowerSample, PowerStatus};
use crate::health::HealthState;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Usage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub usage_pct: f32,
}

impl Usage {
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        let used_bytes = used_bytes.min(total_bytes);
        let usage_pct = if total_bytes == 0 {
            0.0
        } else {
            (used_bytes as f64 / total_bytes as f64 * 100.0) as f32
        };
        Usage {
            total_bytes,
            used_bytes,
            usage_pct,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InterfaceAddress {
    pub interface: String,
    pub address: Ipv4Addr,
}

/// OS-side metrics from one sampler pass. `None` marks a source that was
/// unavailable on this pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampledMetrics {
    pub cpu_freq_mhz: Option<f32>,
    pub cpu_usage_pct: Option<f32>,
    pub cpu_temp_c: Option<f32>,
    pub memory: Option<Usage>,
    pub disk: Option<Usage>,
    pub ip_addresses: Vec<InterfaceAddress>,
    pub primary_address: Option<Ipv4Addr>,
    pub net_rx_bps: Option<f64>,
    pub net_tx_bps: Option<f64>,
}

/// Everything shown for one tick. Built once, then only read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemSnapshot {
    #[serde(flatten)]
    pub metrics: SampledMetrics,
    pub power_rails: PowerRails,
    pub power_status: PowerStatus,
    pub total_power_w: f64,
    pub throttle_bits: Option<u32>,
    pub health: HealthState,
}

impl SystemSnapshot {
    /// Assemble a snapshot; `total_power_w` is always derived from the rails.
    pub fn new(
        metrics: SampledMetrics,
        power: PowerSample,
        throttle_bits: Option<u32>,
        health: HealthState,
    ) -> Self {
        let total_power_w = power.rails.total_power_w();
        SystemSnapshot {
            metrics,
            power_rails: power.rails,
            power_status: power.status,
            total_power_w,
            throttle_bits,
            health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::power::RailReading;

    #[test]
    fn usage_percent_from_bytes() {
        let usage = Usage::new(1000, 250);
        assert!((usage.usage_pct - 25.0).abs() < 1e-4);
        assert_eq!(Usage::new(0, 0).usage_pct, 0.0);
        // used never exceeds total
        assert_eq!(Usage::new(100, 400).used_bytes, 100);
    }

    #[test]
    fn total_power_tracks_rails() {
        let mut rails = PowerRails::default();
        rails.insert("EXT5V", RailReading::new(5.0, 1.0));
        let snapshot = SystemSnapshot::new(
            SampledMetrics::default(),
            PowerSample::available(rails),
            None,
            HealthState::Ok,
        );
        assert!((snapshot.total_power_w - 5.0).abs() < 1e-9);
    }
}
