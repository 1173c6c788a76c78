use color_eyre::Result;

use super::DisplaySink;
use crate::config::DisplayConfig;

/// Open the I²C bus and bring the panel up. Any failure here is fatal.
#[cfg(target_os = "linux")]
pub fn open_panel(config: &DisplayConfig) -> Result<Box<dyn DisplaySink>> {
    use color_eyre::eyre::{WrapErr, eyre};
    use linux_embedded_hal::I2cdev;

    use super::ssd1306::Ssd1306;

    let i2c = I2cdev::new(&config.i2c_bus)
        .map_err(|err| eyre!("cannot open {}: {err}", config.i2c_bus.display()))?;
    let mut panel = Ssd1306::new(i2c, config.address);
    panel
        .init(config.contrast, config.rotate_180)
        .wrap_err_with(|| format!("no SSD1306 answering on {}", config.i2c_bus.display()))?;
    Ok(Box::new(panel))
}

#[cfg(not(target_os = "linux"))]
pub fn open_panel(config: &DisplayConfig) -> Result<Box<dyn DisplaySink>> {
    color_eyre::eyre::bail!(
        "I2C displays are only supported on Linux (wanted {}); use --preview",
        config.i2c_bus.display()
    )
}
