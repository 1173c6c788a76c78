//! Drawing primitives shared by the pages.
//!
//! Every text helper takes the width of its slot and cuts the string to fit,
//! so no field can spill into its neighbour or past the panel edge.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::format::truncate_columns;

/// Outline box with 3px corners.
pub fn draw_panel<D>(target: &mut D, top_left: Point, bottom_right: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let rect = Rectangle::with_corners(top_left, bottom_right);
    RoundedRectangle::with_equal_corners(rect, Size::new(3, 3))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)
}

/// Vertical bar filling from the bottom, `percent` clamped to 0–100.
/// One-pixel outline, one-pixel gap between outline and fill.
pub fn draw_vertical_bar<D>(
    target: &mut D,
    top_left: Point,
    bottom_right: Point,
    percent: Option<f32>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::with_corners(top_left, bottom_right)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)?;

    let Some(percent) = percent.filter(|p| p.is_finite()) else {
        return Ok(());
    };
    let inner_top = top_left.y + 2;
    let inner_bottom = bottom_right.y - 2;
    let inner_height = inner_bottom - inner_top + 1;
    if inner_height <= 0 {
        return Ok(());
    }
    let filled = (inner_height as f32 * percent.clamp(0.0, 100.0) / 100.0).round() as i32;
    if filled == 0 {
        return Ok(());
    }
    Rectangle::with_corners(
        Point::new(top_left.x + 2, inner_bottom - filled + 1),
        Point::new(bottom_right.x - 2, inner_bottom),
    )
    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
    .draw(target)
}

fn columns_for(font: &MonoFont<'_>, width: u32) -> usize {
    let advance = font.character_size.width + font.character_spacing;
    (width / advance.max(1)) as usize
}

fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    let advance = font.character_size.width + font.character_spacing;
    text.chars().count() as u32 * advance
}

/// Left-aligned text inside a slot `max_width` pixels wide.
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    top_left: Point,
    max_width: u32,
    font: &MonoFont<'_>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let fitted = truncate_columns(text, columns_for(font, max_width));
    let style = MonoTextStyle::new(font, BinaryColor::On);
    Text::with_baseline(&fitted, top_left, style, Baseline::Top).draw(target)?;
    Ok(())
}

/// Text centred on `center_x` inside a slot `max_width` pixels wide.
pub fn draw_text_centered<D>(
    target: &mut D,
    text: &str,
    center_x: i32,
    top: i32,
    max_width: u32,
    font: &MonoFont<'_>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let fitted = truncate_columns(text, columns_for(font, max_width));
    let left = center_x - (text_width(font, &fitted) / 2) as i32;
    let style = MonoTextStyle::new(font, BinaryColor::On);
    Text::with_baseline(&fitted, Point::new(left, top), style, Baseline::Top).draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mono_font::iso_8859_1::FONT_5X8;

    use super::*;
    use crate::render::frame::Frame;

    #[test]
    fn bar_fill_tracks_percent() {
        let mut empty = Frame::new();
        draw_vertical_bar(&mut empty, Point::new(0, 0), Point::new(7, 31), Some(0.0)).unwrap();
        let mut full = Frame::new();
        draw_vertical_bar(&mut full, Point::new(0, 0), Point::new(7, 31), Some(100.0)).unwrap();
        let mut over = Frame::new();
        draw_vertical_bar(&mut over, Point::new(0, 0), Point::new(7, 31), Some(250.0)).unwrap();

        assert!(full.lit_pixels() > empty.lit_pixels());
        assert_eq!(full, over);
        // gap row between outline and fill stays dark
        assert!(!full.pixel(3, 1));
        assert!(full.pixel(3, 2));
        assert!(full.pixel(3, 29));
    }

    #[test]
    fn unavailable_bar_is_outline_only() {
        let mut outline = Frame::new();
        draw_vertical_bar(&mut outline, Point::new(0, 0), Point::new(7, 31), None).unwrap();
        let mut zero = Frame::new();
        draw_vertical_bar(&mut zero, Point::new(0, 0), Point::new(7, 31), Some(0.0)).unwrap();
        assert_eq!(outline, zero);
    }

    #[test]
    fn text_is_cut_to_its_slot() {
        let mut frame = Frame::new();
        draw_text(&mut frame, "192.168.100.200", Point::new(0, 0), 20, &FONT_5X8).unwrap();
        for x in 20..128 {
            for y in 0..8 {
                assert!(!frame.pixel(x, y), "pixel at {x},{y} outside slot");
            }
        }
        assert!(frame.lit_pixels() > 0);
    }

    #[test]
    fn centered_text_stays_in_slot() {
        let mut frame = Frame::new();
        draw_text_centered(&mut frame, "a very long label", 64, 0, 30, &FONT_5X8).unwrap();
        for y in 0..8 {
            for x in (0..49).chain(80..128) {
                assert!(!frame.pixel(x, y), "pixel at {x},{y} outside slot");
            }
        }
    }
}
