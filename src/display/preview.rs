//! Terminal stand-in for the OLED, two pixel rows per cell.

use color_eyre::Result;
use ratatui::DefaultTerminal;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use super::DisplaySink;
use crate::render::frame::{Frame, HEIGHT, WIDTH};

pub struct TerminalPreview {
    terminal: DefaultTerminal,
}

impl TerminalPreview {
    pub fn new() -> Result<Self> {
        let terminal = ratatui::try_init()?;
        Ok(TerminalPreview { terminal })
    }
}

impl DisplaySink for TerminalPreview {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        let lines = frame_lines(frame);
        self.terminal.draw(|f| {
            let block = Block::bordered().title(" oledmon (q to quit) ");
            let panel = Paragraph::new(lines)
                .style(Style::default().fg(Color::Cyan))
                .block(block);
            f.render_widget(panel, f.area());
        })?;
        Ok(())
    }
}

impl Drop for TerminalPreview {
    fn drop(&mut self) {
        ratatui::restore();
    }
}

/// Fold pixel row pairs into half-block characters.
pub fn frame_lines(frame: &Frame) -> Vec<Line<'static>> {
    (0..HEIGHT / 2)
        .map(|row| {
            let text: String = (0..WIDTH)
                .map(|x| match (frame.pixel(x, row * 2), frame.pixel(x, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect();
            Line::from(text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_blocks_cover_pixel_pairs() {
        let mut frame = Frame::new();
        frame.set_pixel(0, 0, true);
        frame.set_pixel(1, 1, true);
        frame.set_pixel(2, 0, true);
        frame.set_pixel(2, 1, true);
        let lines = frame_lines(&frame);
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0].width(), 128);
        let first: String = lines[0].to_string().chars().take(4).collect();
        assert_eq!(first, "▀▄█ ");
        assert!(lines[31].to_string().trim().is_empty());
    }
}
