//! Reduce the firmware throttle mask to a single displayed state.
//!
//! Bits of `vcgencmd get_throttled`:
//!
//! | bit | meaning                      |
//! |-----|------------------------------|
//! | 0   | under-voltage detected       |
//! | 1   | ARM frequency capped         |
//! | 2   | currently throttled          |
//! | 3   | soft temperature limit       |
//! | 16  | under-voltage has occurred   |
//! | 17  | frequency capping occurred   |
//! | 18  | throttling has occurred      |
//! | 19  | soft temp limit has occurred |
//!
//! Several conditions may be active at once. The surfaced state follows a
//! fixed priority, most severe first:
//! `UnderVoltage > ThrottledVoltage > ThrottledHeat > Ok`.
//! Evaluation has no memory: each tick stands alone.

use serde::Serialize;

use crate::system::snapshot::SampledMetrics;

pub const UNDER_VOLTAGE: u32 = 1 << 0;
pub const FREQ_CAPPED: u32 = 1 << 1;
pub const THROTTLED: u32 = 1 << 2;
pub const SOFT_TEMP_LIMIT: u32 = 1 << 3;
pub const UNDER_VOLTAGE_OCCURRED: u32 = 1 << 16;
pub const FREQ_CAPPED_OCCURRED: u32 = 1 << 17;
pub const THROTTLED_OCCURRED: u32 = 1 << 18;
pub const SOFT_TEMP_LIMIT_OCCURRED: u32 = 1 << 19;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Ok,
    ThrottledHeat,
    ThrottledVoltage,
    UnderVoltage,
}

impl HealthState {
    pub fn label(self) -> &'static str {
        match self {
            HealthState::Ok => "OK",
            HealthState::ThrottledHeat => "HOT",
            HealthState::ThrottledVoltage => "THRT",
            HealthState::UnderVoltage => "LOW V",
        }
    }
}

/// Health for one tick. Without firmware bits the CPU temperature decides.
pub fn evaluate(firmware_bits: Option<u32>, metrics: &SampledMetrics, heat_limit_c: f32) -> HealthState {
    match firmware_bits {
        Some(bits) => from_bits(bits),
        None => match metrics.cpu_temp_c {
            Some(temp) if temp >= heat_limit_c => HealthState::ThrottledHeat,
            _ => HealthState::Ok,
        },
    }
}

pub fn from_bits(bits: u32) -> HealthState {
    if bits & UNDER_VOLTAGE != 0 {
        HealthState::UnderVoltage
    } else if bits & THROTTLED != 0 {
        HealthState::ThrottledVoltage
    } else if bits & (FREQ_CAPPED | SOFT_TEMP_LIMIT) != 0 {
        HealthState::ThrottledHeat
    } else {
        HealthState::Ok
    }
}

/// Sticky "since boot" conditions, shown as small markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PastEvents {
    pub under_voltage: bool,
    pub freq_capped: bool,
    pub throttled: bool,
    pub soft_temp_limit: bool,
}

impl PastEvents {
    pub fn from_bits(bits: u32) -> Self {
        PastEvents {
            under_voltage: bits & UNDER_VOLTAGE_OCCURRED != 0,
            freq_capped: bits & FREQ_CAPPED_OCCURRED != 0,
            throttled: bits & THROTTLED_OCCURRED != 0,
            soft_temp_limit: bits & SOFT_TEMP_LIMIT_OCCURRED != 0,
        }
    }

    pub fn any(&self) -> bool {
        self.under_voltage || self.freq_capped || self.throttled || self.soft_temp_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_at(temp: Option<f32>) -> SampledMetrics {
        SampledMetrics {
            cpu_temp_c: temp,
            ..SampledMetrics::default()
        }
    }

    #[test]
    fn single_bits_map_to_states() {
        assert_eq!(from_bits(0), HealthState::Ok);
        assert_eq!(from_bits(UNDER_VOLTAGE), HealthState::UnderVoltage);
        assert_eq!(from_bits(FREQ_CAPPED), HealthState::ThrottledHeat);
        assert_eq!(from_bits(SOFT_TEMP_LIMIT), HealthState::ThrottledHeat);
        assert_eq!(from_bits(THROTTLED), HealthState::ThrottledVoltage);
    }

    #[test]
    fn priority_with_several_bits() {
        assert_eq!(from_bits(0x7), HealthState::UnderVoltage);
        assert_eq!(from_bits(THROTTLED | FREQ_CAPPED), HealthState::ThrottledVoltage);
        assert_eq!(from_bits(0x50005), HealthState::UnderVoltage);
    }

    #[test]
    fn sticky_bits_alone_are_ok() {
        assert_eq!(from_bits(0x50000), HealthState::Ok);
        let past = PastEvents::from_bits(0x50000);
        assert!(past.under_voltage);
        assert!(past.throttled);
        assert!(!past.freq_capped);
        assert!(past.any());
        assert!(!PastEvents::from_bits(0x7).any());
    }

    #[test]
    fn firmware_bits_win_over_temperature() {
        let hot = metrics_at(Some(95.0));
        assert_eq!(evaluate(Some(0), &hot, 85.0), HealthState::Ok);
        assert_eq!(evaluate(Some(UNDER_VOLTAGE), &hot, 85.0), HealthState::UnderVoltage);
    }

    #[test]
    fn temperature_fallback_without_firmware() {
        assert_eq!(evaluate(None, &metrics_at(Some(85.0)), 85.0), HealthState::ThrottledHeat);
        assert_eq!(evaluate(None, &metrics_at(Some(60.0)), 85.0), HealthState::Ok);
        assert_eq!(evaluate(None, &metrics_at(None), 85.0), HealthState::Ok);
    }

    #[test]
    fn no_hidden_state_between_calls() {
        let metrics = metrics_at(Some(50.0));
        let first = evaluate(Some(UNDER_VOLTAGE), &metrics, 85.0);
        assert_eq!(evaluate(Some(0), &metrics, 85.0), HealthState::Ok);
        assert_eq!(evaluate(Some(UNDER_VOLTAGE), &metrics, 85.0), first);
    }
}
