use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use oledmon::app::{App, collect_once};
use oledmon::config::{Config, ConfigIssue, load_config, load_config_from_path};
use oledmon::display::DisplaySink;
use oledmon::display::bus::open_panel;
use oledmon::display::preview::TerminalPreview;
use oledmon::event::Shutdown;
use oledmon::logging;
use oledmon::render::icons::IconSet;

#[derive(Parser, Debug)]
#[command(
    name = "oledmon",
    version,
    about = "Raspberry Pi telemetry on a 128x64 SSD1306 OLED"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Display refresh interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Power report interval in milliseconds
    #[arg(long)]
    power_report_ms: Option<u64>,

    /// I2C bus device, e.g. /dev/i2c-1
    #[arg(long)]
    i2c_bus: Option<PathBuf>,

    /// 7-bit I2C address of the panel (decimal or 0x hex)
    #[arg(long, value_parser = parse_address)]
    address: Option<u8>,

    /// Directory holding the icon bitmaps
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Draw frames in the terminal instead of on the OLED
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Print one snapshot as JSON and exit
    #[arg(long, default_value_t = false, conflicts_with = "preview")]
    once: bool,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, issue) = load_config_for_cli(&cli);
    // stderr output would tear the preview.
    if cli.preview {
        logging::scoped(&config.logging, || issue.as_ref().map(ConfigIssue::log))?;
    } else {
        logging::init(&config.logging)?;
        if let Some(issue) = &issue {
            issue.log();
        }
    }
    config.validate().wrap_err("invalid configuration")?;

    if cli.once {
        let snapshot = collect_once(&config).await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let icons = IconSet::load(&config.assets.icon_dir).wrap_err("cannot load icons")?;
    let mut shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let sink: Box<dyn DisplaySink> = if cli.preview {
        shutdown.listen_for_keys();
        Box::new(TerminalPreview::new().wrap_err("cannot open terminal preview")?)
    } else {
        open_panel(&config.display)?
    };

    let mut app = App::new(&config, icons, sink)?;
    app.run(&mut shutdown).await
}

fn load_config_for_cli(cli: &Cli) -> (Config, Option<ConfigIssue>) {
    let (mut config, issue) = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ms) = cli.refresh_ms {
        config.general.refresh_interval_ms = ms;
    }
    if let Some(ms) = cli.power_report_ms {
        config.general.power_report_interval_ms = ms;
    }
    if let Some(ref bus) = cli.i2c_bus {
        config.display.i2c_bus = bus.clone();
    }
    if let Some(address) = cli.address {
        config.display.address = address;
    }
    if let Some(ref dir) = cli.assets {
        config.assets.icon_dir = dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    // The report would scribble over the preview.
    if cli.preview {
        config.general.print_power_report = false;
    }

    (config, issue)
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(address) if address <= 0x7F => Ok(address),
        Ok(address) => Err(format!("{address:#x} is not a 7-bit address")),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "oledmon",
            "--config",
            "/nonexistent/oledmon.toml",
            "--refresh-ms",
            "250",
            "--power-report-ms",
            "10000",
            "--address",
            "0x3d",
            "--i2c-bus",
            "/dev/i2c-3",
            "--log-level",
            "debug",
        ]);
        let (config, issue) = load_config_for_cli(&cli);
        assert!(issue.is_some());
        assert_eq!(config.general.refresh_interval_ms, 250);
        assert_eq!(config.general.power_report_interval_ms, 10_000);
        assert_eq!(config.display.address, 0x3D);
        assert_eq!(config.display.i2c_bus, PathBuf::from("/dev/i2c-3"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.general.print_power_report);
    }

    #[test]
    fn preview_silences_stdout_report() {
        let cli = Cli::parse_from(["oledmon", "--config", "/nonexistent/oledmon.toml", "--preview"]);
        assert!(!load_config_for_cli(&cli).0.general.print_power_report);
    }

    #[test]
    fn address_parsing() {
        assert_eq!(parse_address("60"), Ok(0x3C));
        assert_eq!(parse_address("0x3C"), Ok(0x3C));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("oled").is_err());
    }

    #[test]
    fn once_and_preview_conflict() {
        assert!(Cli::try_parse_from(["oledmon", "--once", "--preview"]).is_err());
    }
}
