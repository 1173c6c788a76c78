use embedded_graphics::mono_font::iso_8859_1::{FONT_4X6, FONT_5X8};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::icons::{IconKind, IconSet};
use super::overview::address_rotation;
use super::widgets::draw_text;
use super::{Page, draw_header};
use crate::format::format_mbps;
use crate::system::snapshot::SystemSnapshot;

const ROW_TOPS: [i32; 4] = [18, 27, 36, 45];

pub(super) fn draw<D>(target: &mut D, snapshot: &SystemSnapshot, icons: &IconSet) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_header(target, Page::Network, snapshot.health, icons)?;

    let entries = address_rotation(snapshot);
    if entries.is_empty() {
        draw_text(target, "No connection", Point::new(0, ROW_TOPS[0]), 128, &FONT_5X8)?;
    } else {
        let shown = if entries.len() > ROW_TOPS.len() {
            ROW_TOPS.len() - 1
        } else {
            entries.len()
        };
        for ((interface, address), top) in entries.iter().take(shown).zip(ROW_TOPS) {
            let line = format!("{interface:<6} {address}");
            draw_text(target, &line, Point::new(0, top), 128, &FONT_5X8)?;
        }
        if shown < entries.len() {
            let more = format!("+{} more", entries.len() - shown);
            draw_text(target, &more, Point::new(0, ROW_TOPS[shown]), 128, &FONT_5X8)?;
        }
    }

    let m = &snapshot.metrics;
    icons.get(IconKind::Download).draw(target, Point::new(0, 55))?;
    draw_text(target, &format_mbps(m.net_rx_bps), Point::new(10, 56), 40, &FONT_4X6)?;
    icons.get(IconKind::Upload).draw(target, Point::new(54, 55))?;
    draw_text(target, &format_mbps(m.net_tx_bps), Point::new(64, 56), 40, &FONT_4X6)?;
    draw_text(target, "Mbps", Point::new(108, 56), 20, &FONT_4X6)
}
