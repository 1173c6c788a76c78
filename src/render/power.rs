use embedded_graphics::mono_font::iso_8859_1::{FONT_4X6, FONT_5X8};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::icons::IconSet;
use super::widgets::{draw_text, draw_text_centered};
use super::{Page, draw_header};
use crate::firmware::power::{PowerRails, PowerStatus};
use crate::format::{format_fitted, truncate_columns};
use crate::system::snapshot::SystemSnapshot;

const MAX_ROWS: usize = 5;
const ROW_PITCH: i32 = 7;
const FIRST_ROW: i32 = 17;

pub(super) fn draw<D>(target: &mut D, snapshot: &SystemSnapshot, icons: &IconSet) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_header(target, Page::Power, snapshot.health, icons)?;

    match snapshot.power_status {
        PowerStatus::Unsupported => draw_text_centered(target, "power unsupported", 64, 30, 128, &FONT_5X8),
        PowerStatus::TimedOut => draw_text_centered(target, "power timeout", 64, 30, 128, &FONT_5X8),
        PowerStatus::Available => {
            for (row, line) in rail_lines(&snapshot.power_rails).iter().enumerate() {
                let top = FIRST_ROW + row as i32 * ROW_PITCH;
                draw_text(target, line, Point::new(0, top), 128, &FONT_4X6)?;
            }
            let total = format!("TOTAL {}W", format_fitted(snapshot.total_power_w, 7, 2));
            draw_text(target, &total, Point::new(0, 55), 128, &FONT_5X8)
        }
    }
}

/// One line per rail; past the row limit the last row counts the rest.
pub(super) fn rail_lines(rails: &PowerRails) -> Vec<String> {
    let shown = if rails.len() > MAX_ROWS {
        MAX_ROWS - 1
    } else {
        rails.len()
    };
    let mut lines: Vec<String> = rails
        .iter()
        .take(shown)
        .map(|rail| {
            let r = &rail.reading;
            format!(
                "{:<10} {:>5}V {:>5}A {:>5}W",
                truncate_columns(&rail.name, 10),
                format_fitted(r.voltage_v, 5, 2),
                format_fitted(r.current_a, 5, 3),
                format_fitted(r.power_w(), 5, 2)
            )
        })
        .collect();
    if shown < rails.len() {
        lines.push(format!("+{} more", rails.len() - shown));
    }
    lines
}
