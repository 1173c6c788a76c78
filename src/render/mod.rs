pub mod frame;
pub mod icons;
mod network;
mod overview;
mod power;
pub mod widgets;

use embedded_graphics::mono_font::iso_8859_1::{FONT_5X8, FONT_6X10};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};

use crate::health::HealthState;
use crate::system::snapshot::SystemSnapshot;
use frame::{Frame, WIDTH};
use icons::{IconKind, IconSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    Network,
    Power,
}

impl Page {
    pub fn from_config_str(s: &str) -> Option<Page> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" => Some(Page::Overview),
            "network" => Some(Page::Network),
            "power" => Some(Page::Power),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "OVERVIEW",
            Page::Network => "NETWORK",
            Page::Power => "POWER",
        }
    }
}

/// The page shown on display tick `tick` when each page stays up for
/// `page_ticks` ticks.
pub fn page_for_tick(pages: &[Page], tick: u64, page_ticks: u32) -> Page {
    if pages.is_empty() {
        return Page::Overview;
    }
    let slot = tick / u64::from(page_ticks.max(1));
    pages[(slot % pages.len() as u64) as usize]
}

pub fn health_icon(state: HealthState) -> IconKind {
    match state {
        HealthState::Ok => IconKind::Ok,
        HealthState::ThrottledHeat => IconKind::ThrottledHeat,
        HealthState::ThrottledVoltage => IconKind::ThrottledVoltage,
        HealthState::UnderVoltage => IconKind::UnderVoltage,
    }
}

/// Draw one page into a fresh frame. Pure: the same inputs give the same pixels.
pub fn render(snapshot: &SystemSnapshot, page: Page, icons: &IconSet, tick: u64) -> Frame {
    let mut frame = Frame::new();
    if let Err(never) = render_into(&mut frame, snapshot, page, icons, tick) {
        match never {}
    }
    frame
}

pub fn render_into<D>(
    target: &mut D,
    snapshot: &SystemSnapshot,
    page: Page,
    icons: &IconSet,
    tick: u64,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match page {
        Page::Overview => overview::draw(target, snapshot, icons, tick),
        Page::Network => network::draw(target, snapshot, icons),
        Page::Power => power::draw(target, snapshot, icons),
    }
}

/// Title, health icon in the top-right corner, and a rule under both.
fn draw_header<D>(
    target: &mut D,
    page: Page,
    health: HealthState,
    icons: &IconSet,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    widgets::draw_text(target, page.title(), Point::new(0, 2), 108, &FONT_6X10)?;
    icons.get(health_icon(health)).draw(target, Point::new(112, 0))?;
    Line::new(Point::new(0, 14), Point::new(108, 14))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)
}

/// Startup frame: logo and version.
pub fn render_splash(icons: &IconSet) -> Frame {
    let mut frame = Frame::new();
    if let Err(never) = draw_splash(&mut frame, icons) {
        match never {}
    }
    frame
}

fn draw_splash<D>(target: &mut D, icons: &IconSet) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let logo = icons.get(IconKind::Logo);
    let x = (WIDTH as i32 - logo.size().width as i32).max(0) / 2;
    logo.draw(target, Point::new(x, 6))?;
    let version = concat!("oledmon v", env!("CARGO_PKG_VERSION"));
    widgets::draw_text_centered(target, version, WIDTH as i32 / 2, 48, WIDTH, &FONT_5X8)
}
