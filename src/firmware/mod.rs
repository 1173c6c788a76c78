pub mod power;
pub mod throttle;

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use power::{PowerSample, parse_pmic_output};
use throttle::parse_throttled;

#[derive(Debug)]
enum CommandOutcome {
    Output(String),
    Missing,
    Failed(Option<i32>),
    TimedOut,
    Io(io::Error),
}

/// Bounded access to the `vcgencmd` firmware tool.
///
/// Every invocation is capped by `timeout`; the child is killed when the
/// deadline passes. A tool that is absent or reports nothing useful is
/// remembered as unsupported and not spawned again.
#[derive(Debug)]
pub struct FirmwareClient {
    program: PathBuf,
    timeout: Duration,
    power_unsupported: bool,
    throttle_unsupported: bool,
}

impl FirmwareClient {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        FirmwareClient {
            program: program.into(),
            timeout,
            power_unsupported: false,
            throttle_unsupported: false,
        }
    }

    pub fn power_supported(&self) -> bool {
        !self.power_unsupported
    }

    /// Read PMIC rails. Never fails: unsupported hardware and timeouts are
    /// reported through [`PowerSample::status`].
    pub async fn query_power(&mut self) -> PowerSample {
        if self.power_unsupported {
            return PowerSample::unsupported();
        }

        match self.run(&["pmic_read_adc"]).await {
            CommandOutcome::Output(stdout) => {
                let sample = PowerSample::available(parse_pmic_output(&stdout));
                if sample.rails.is_empty() {
                    tracing::info!("pmic_read_adc reported no complete rail; power metrics unsupported");
                    self.power_unsupported = true;
                }
                sample
            }
            CommandOutcome::Missing => {
                tracing::info!(program = %self.program.display(), "firmware tool not found; power metrics unsupported");
                self.power_unsupported = true;
                PowerSample::unsupported()
            }
            CommandOutcome::Failed(code) => {
                tracing::info!(?code, "pmic_read_adc failed; power metrics unsupported");
                self.power_unsupported = true;
                PowerSample::unsupported()
            }
            CommandOutcome::TimedOut => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "pmic_read_adc timed out");
                PowerSample::timed_out()
            }
            CommandOutcome::Io(err) => {
                tracing::warn!(%err, "pmic_read_adc could not be read");
                PowerSample::timed_out()
            }
        }
    }

    /// Raw `get_throttled` mask, `None` when it could not be read.
    pub async fn query_throttled(&mut self) -> Option<u32> {
        if self.throttle_unsupported {
            return None;
        }

        match self.run(&["get_throttled"]).await {
            CommandOutcome::Output(stdout) => {
                let bits = parse_throttled(&stdout);
                if bits.is_none() {
                    tracing::debug!(output = stdout.trim(), "unparsable get_throttled output");
                }
                bits
            }
            CommandOutcome::Missing | CommandOutcome::Failed(_) => {
                tracing::info!("get_throttled unavailable; health falls back to temperature");
                self.throttle_unsupported = true;
                None
            }
            CommandOutcome::TimedOut => {
                tracing::warn!("get_throttled timed out");
                None
            }
            CommandOutcome::Io(err) => {
                tracing::warn!(%err, "get_throttled could not be read");
                None
            }
        }
    }

    async fn run(&self, args: &[&str]) -> CommandOutcome {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return CommandOutcome::Missing,
            Err(err) => return CommandOutcome::Io(err),
        };

        // Dropping the pending future on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => CommandOutcome::TimedOut,
            Ok(Err(err)) => CommandOutcome::Io(err),
            Ok(Ok(output)) if !output.status.success() => CommandOutcome::Failed(output.status.code()),
            Ok(Ok(output)) => CommandOutcome::Output(String::from_utf8_lossy(&output.stdout).into_owned()),
        }
    }
}
