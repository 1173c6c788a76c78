pub mod bus;
pub mod preview;
pub mod ssd1306;

use color_eyre::Result;

use crate::render::frame::Frame;

/// Where finished frames go. A sink is opened once at startup and owned by
/// the app; dropping it blanks or releases the output.
pub trait DisplaySink {
    /// Push a complete frame. Partial frames are never written.
    fn show(&mut self, frame: &Frame) -> Result<()>;
}
