//! Dashboard page: CPU, RAM and disk gauges on top, network and health below.

use std::net::Ipv4Addr;

use embedded_graphics::mono_font::iso_8859_1::{FONT_4X6, FONT_5X8, FONT_6X10};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::health_icon;
use super::icons::{IconKind, IconSet};
use super::widgets::{draw_panel, draw_text, draw_text_centered, draw_vertical_bar};
use crate::format::{UNAVAILABLE, format_celsius, format_ghz, format_gib, format_mbps, format_percent};
use crate::health::{HealthState, PastEvents};
use crate::system::snapshot::{SystemSnapshot, Usage};

/// Ticks each address stays up before the next one rotates in.
const ADDRESS_TICKS: u64 = 3;

pub(super) fn draw<D>(
    target: &mut D,
    snapshot: &SystemSnapshot,
    icons: &IconSet,
    tick: u64,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let m = &snapshot.metrics;

    // CPU
    draw_panel(target, Point::new(0, 0), Point::new(55, 35))?;
    icons.get(IconKind::Cpu).draw(target, Point::new(3, 3))?;
    draw_text_centered(target, &format_percent(m.cpu_usage_pct), 32, 6, 24, &FONT_6X10)?;
    draw_text_centered(target, &format_ghz(m.cpu_freq_mhz), 23, 19, 40, &FONT_5X8)?;
    draw_text_centered(target, &format_celsius(m.cpu_temp_c), 23, 27, 40, &FONT_5X8)?;
    draw_vertical_bar(target, Point::new(46, 2), Point::new(53, 33), m.cpu_usage_pct)?;

    draw_usage_panel(target, icons, IconKind::Ram, 57, m.memory)?;
    draw_usage_panel(target, icons, IconKind::Disk, 93, m.disk)?;

    draw_network_panel(target, snapshot, icons, tick)?;
    draw_status_panel(target, snapshot, icons)
}

/// 35px wide box: icon, used GiB over total GiB, and a bar on the right edge.
fn draw_usage_panel<D>(
    target: &mut D,
    icons: &IconSet,
    icon: IconKind,
    left: i32,
    usage: Option<Usage>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_panel(target, Point::new(left, 0), Point::new(left + 34, 35))?;
    icons.get(icon).draw(target, Point::new(left + 3, 2))?;
    let (used, total) = match usage {
        Some(u) => (format_gib(u.used_bytes), format_gib(u.total_bytes)),
        None => (UNAVAILABLE.to_string(), UNAVAILABLE.to_string()),
    };
    draw_text_centered(target, &used, left + 12, 19, 22, &FONT_5X8)?;
    draw_text_centered(target, &total, left + 12, 27, 22, &FONT_5X8)?;
    draw_vertical_bar(
        target,
        Point::new(left + 25, 2),
        Point::new(left + 32, 33),
        usage.map(|u| u.usage_pct),
    )
}

fn draw_network_panel<D>(
    target: &mut D,
    snapshot: &SystemSnapshot,
    icons: &IconSet,
    tick: u64,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let m = &snapshot.metrics;
    draw_panel(target, Point::new(0, 37), Point::new(91, 63))?;
    icons.get(IconKind::Network).draw(target, Point::new(3, 40))?;

    let entries = address_rotation(snapshot);
    if entries.is_empty() {
        draw_text(target, "No connection", Point::new(21, 39), 68, &FONT_4X6)?;
    } else {
        let (interface, address) = &entries[((tick / ADDRESS_TICKS) % entries.len() as u64) as usize];
        draw_text(target, &address.to_string(), Point::new(21, 39), 68, &FONT_4X6)?;
        draw_text(target, interface, Point::new(2, 57), 18, &FONT_4X6)?;
    }

    icons.get(IconKind::Download).draw(target, Point::new(21, 47))?;
    draw_text(target, &format_mbps(m.net_rx_bps), Point::new(31, 48), 34, &FONT_4X6)?;
    icons.get(IconKind::Upload).draw(target, Point::new(21, 55))?;
    draw_text(target, &format_mbps(m.net_tx_bps), Point::new(31, 56), 34, &FONT_4X6)?;
    draw_text(target, "Mbps", Point::new(68, 52), 20, &FONT_4X6)
}

fn draw_status_panel<D>(target: &mut D, snapshot: &SystemSnapshot, icons: &IconSet) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_panel(target, Point::new(93, 37), Point::new(127, 63))?;
    icons.get(health_icon(snapshot.health)).draw(target, Point::new(102, 39))?;
    let past = snapshot.throttle_bits.map(PastEvents::from_bits).unwrap_or_default();
    draw_text_centered(target, &status_line(snapshot.health, past), 110, 56, 30, &FONT_4X6)
}

/// Current state when something is wrong, otherwise markers for anything
/// that happened since boot.
pub(super) fn status_line(health: HealthState, past: PastEvents) -> String {
    if health != HealthState::Ok {
        return health.label().to_string();
    }
    let mut markers = Vec::new();
    if past.under_voltage {
        markers.push("UV");
    }
    if past.throttled || past.freq_capped || past.soft_temp_limit {
        markers.push("TH");
    }
    if markers.is_empty() {
        health.label().to_string()
    } else {
        markers.join(" ")
    }
}

/// Addresses to cycle through, the primary-route address first.
pub(super) fn address_rotation(snapshot: &SystemSnapshot) -> Vec<(String, Ipv4Addr)> {
    let m = &snapshot.metrics;
    let mut entries: Vec<(String, Ipv4Addr)> = Vec::with_capacity(m.ip_addresses.len() + 1);
    if let Some(primary) = m.primary_address {
        let interface = m
            .ip_addresses
            .iter()
            .find(|a| a.address == primary)
            .map(|a| a.interface.clone())
            .unwrap_or_else(|| "route".to_string());
        entries.push((interface, primary));
    }
    for entry in &m.ip_addresses {
        if Some(entry.address) != m.primary_address {
            entries.push((entry.interface.clone(), entry.address));
        }
    }
    entries
}
