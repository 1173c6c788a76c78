//! PMIC rail telemetry from `vcgencmd pmic_read_adc`.
//!
//! The tool's output differs between board revisions. Two layouts are known:
//!
//! ```text
//! EXT5V_V=5.0234V EXT5V_I=0.5000A
//!      3V3_SYS_A current(1)=0.07027680A
//!      3V3_SYS_V volt(9)=3.31370000V
//! ```
//!
//! Both are reduced to `key=value` pairs; a rail only appears in the result
//! once both its voltage and its current were seen.

use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RailReading {
    pub voltage_v: f64,
    pub current_a: f64,
}

impl RailReading {
    pub fn new(voltage_v: f64, current_a: f64) -> Self {
        RailReading {
            voltage_v,
            current_a,
        }
    }

    pub fn power_w(&self) -> f64 {
        self.voltage_v * self.current_a
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rail {
    pub name: String,
    #[serde(flatten)]
    pub reading: RailReading,
}

/// Rails in discovery order, unique by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PowerRails {
    rails: Vec<Rail>,
}

impl PowerRails {
    /// Insert or replace a rail. A replaced rail keeps its position.
    pub fn insert(&mut self, name: &str, reading: RailReading) {
        match self.rails.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.reading = reading,
            None => self.rails.push(Rail {
                name: name.to_string(),
                reading,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RailReading> {
        self.rails.iter().find(|r| r.name == name).map(|r| &r.reading)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rail> {
        self.rails.iter()
    }

    pub fn len(&self) -> usize {
        self.rails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rails.is_empty()
    }

    pub fn total_power_w(&self) -> f64 {
        self.rails.iter().map(|r| r.reading.power_w()).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerStatus {
    Available,
    /// Tool missing, failing, or reporting no complete rail. Lasts for the session.
    Unsupported,
    /// The query ran past its deadline on this tick only.
    TimedOut,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerSample {
    pub rails: PowerRails,
    pub status: PowerStatus,
}

impl PowerSample {
    /// Rails from a successful query. No complete rail means unsupported.
    pub fn available(rails: PowerRails) -> Self {
        if rails.is_empty() {
            return Self::unsupported();
        }
        PowerSample {
            rails,
            status: PowerStatus::Available,
        }
    }

    pub fn unsupported() -> Self {
        PowerSample {
            rails: PowerRails::default(),
            status: PowerStatus::Unsupported,
        }
    }

    pub fn timed_out() -> Self {
        PowerSample {
            rails: PowerRails::default(),
            status: PowerStatus::TimedOut,
        }
    }

    pub fn total_power_w(&self) -> f64 {
        self.rails.total_power_w()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quantity {
    Voltage,
    Current,
}

/// Collects voltages and currents separately; only complete pairs survive.
#[derive(Debug, Default)]
struct RailAccumulator {
    order: Vec<String>,
    voltages: HashMap<String, f64>,
    currents: HashMap<String, f64>,
}

impl RailAccumulator {
    fn record(&mut self, name: String, quantity: Quantity, value: f64) {
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        match quantity {
            Quantity::Voltage => self.voltages.insert(name, value),
            Quantity::Current => self.currents.insert(name, value),
        };
    }

    fn finish(self) -> PowerRails {
        let mut rails = PowerRails::default();
        for name in &self.order {
            if let (Some(&v), Some(&i)) = (self.voltages.get(name), self.currents.get(name)) {
                rails.insert(name, RailReading::new(v, i));
            }
        }
        rails
    }
}

pub fn parse_pmic_output(output: &str) -> PowerRails {
    let mut acc = RailAccumulator::default();

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        for (idx, token) in tokens.iter().enumerate() {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let Some(value) = parse_value(value) else {
                continue;
            };

            let indexed = indexed_quantity(key);
            let (label, quantity) = match indexed {
                // `LABEL current(n)=...`: the label is the previous bare token.
                Some(quantity) => match idx.checked_sub(1).map(|i| tokens[i]) {
                    Some(label) if !label.contains('=') => (label, Some(quantity)),
                    _ => continue,
                },
                None => (key, None),
            };

            let Some(quantity) = quantity.or_else(|| classify_key(label)) else {
                continue;
            };
            let Some(name) = rail_name(label, quantity) else {
                continue;
            };
            acc.record(name, quantity, value);
        }
    }

    acc.finish()
}

fn indexed_quantity(key: &str) -> Option<Quantity> {
    let lower = key.to_ascii_lowercase();
    if !lower.ends_with(')') {
        return None;
    }
    if lower.starts_with("volt(") {
        Some(Quantity::Voltage)
    } else if lower.starts_with("current(") {
        Some(Quantity::Current)
    } else {
        None
    }
}

fn classify_key(key: &str) -> Option<Quantity> {
    let upper = key.to_ascii_uppercase();
    if upper.ends_with("_V") || upper.contains("VOLT") {
        Some(Quantity::Voltage)
    } else if upper.ends_with("_I") || upper.ends_with("_A") || upper.contains("CURR") {
        Some(Quantity::Current)
    } else {
        None
    }
}

fn rail_name(label: &str, quantity: Quantity) -> Option<String> {
    let suffixes: &[&str] = match quantity {
        Quantity::Voltage => &["_V"],
        Quantity::Current => &["_I", "_A"],
    };
    let words: &[&str] = match quantity {
        Quantity::Voltage => &["VOLTAGE", "VOLT"],
        Quantity::Current => &["CURRENT", "CURR"],
    };

    let mut name = label.to_string();
    for suffix in suffixes {
        if name.to_ascii_uppercase().ends_with(suffix) {
            name.truncate(name.len() - suffix.len());
            break;
        }
    }
    for word in words {
        if let Some(pos) = name.to_ascii_uppercase().find(word) {
            name.replace_range(pos..pos + word.len(), "");
            break;
        }
    }

    let name = name.trim_matches(|c| c == '_' || c == '-').to_string();
    (!name.is_empty()).then_some(name)
}

/// Parse `5.0234V`, `500mA`, `0.2` into base units. Power readings and
/// unknown units are rejected.
fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let split = raw
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let scale = match unit {
        "" | "V" | "v" | "A" | "a" => 1.0,
        "mV" | "mv" | "mA" | "ma" => 0.001,
        _ => return None,
    };
    let value: f64 = number.parse().ok()?;
    value.is_finite().then_some(value * scale)
}

/// Multi-line report for the console sink.
pub fn format_report(sample: &PowerSample) -> String {
    let mut out = String::new();
    let rule = "=".repeat(56);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "POWER CONSUMPTION");
    let _ = writeln!(out, "{rule}");

    match sample.status {
        PowerStatus::Available => {
            for rail in sample.rails.iter() {
                let _ = writeln!(
                    out,
                    "{:<16} | V: {:6.3}V | I: {:6.3}A | P: {:6.3}W",
                    rail.name,
                    rail.reading.voltage_v,
                    rail.reading.current_a,
                    rail.reading.power_w()
                );
            }
            let _ = writeln!(out, "{}", "-".repeat(56));
            let _ = writeln!(out, "{:<16} | {:6.3}W", "TOTAL POWER", sample.total_power_w());
        }
        PowerStatus::Unsupported => {
            let _ = writeln!(out, "No PMIC data (pmic_read_adc unsupported on this device)");
        }
        PowerStatus::TimedOut => {
            let _ = writeln!(out, "PMIC query timed out");
        }
    }
    let _ = write!(out, "{rule}");
    out
}
