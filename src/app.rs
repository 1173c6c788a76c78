use std::time::{Duration, Instant};

use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use crate::config::Config;
use crate::display::DisplaySink;
use crate::event::Shutdown;
use crate::firmware::FirmwareClient;
use crate::firmware::power::format_report;
use crate::health::{HealthState, evaluate};
use crate::render::icons::IconSet;
use crate::render::{Page, page_for_tick, render, render_splash};
use crate::scheduler::Schedule;
use crate::system::sampler::Sampler;
use crate::system::snapshot::{SampledMetrics, SystemSnapshot};

/// Owns every long-lived resource of the daemon: sampler, firmware client,
/// icons, the display sink and the schedule.
pub struct App {
    sampler: Sampler,
    firmware: FirmwareClient,
    icons: IconSet,
    sink: Box<dyn DisplaySink>,
    schedule: Schedule,
    pages: Vec<Page>,
    page_ticks: u32,
    resample_every: u32,
    heat_limit_c: f32,
    print_power_report: bool,
    splash: Duration,
    last_metrics: Option<SampledMetrics>,
    last_snapshot: Option<SystemSnapshot>,
}

impl App {
    pub fn new(config: &Config, icons: IconSet, sink: Box<dyn DisplaySink>) -> Result<Self> {
        Ok(App {
            sampler: Sampler::new(&config.sampler),
            firmware: FirmwareClient::new(&config.firmware.vcgencmd, config.firmware_timeout()),
            icons,
            sink,
            schedule: Schedule::new(config.refresh_interval(), config.power_report_interval()),
            pages: config.pages()?,
            page_ticks: config.general.page_ticks,
            resample_every: config.general.resample_every,
            heat_limit_c: config.sampler.heat_limit_c,
            print_power_report: config.general.print_power_report,
            splash: Duration::from_millis(config.general.splash_ms),
            last_metrics: None,
            last_snapshot: None,
        })
    }

    pub fn last_snapshot(&self) -> Option<&SystemSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Drive both cadences until shutdown is requested. A display write
    /// failure ends the loop with an error.
    pub async fn run(&mut self, shutdown: &mut Shutdown) -> Result<()> {
        if !self.splash.is_zero() && shutdown.requested().is_none() {
            self.sink
                .show(&render_splash(&self.icons))
                .wrap_err("display write failed")?;
            tokio::select! {
                _ = tokio::time::sleep(self.splash) => {}
                _ = shutdown.wait() => {}
            }
        }

        loop {
            if let Some(reason) = shutdown.requested() {
                tracing::info!(?reason, ticks = self.schedule.ticks(), "stopping");
                return Ok(());
            }

            if let Some(tick) = self.schedule.display_tick(Instant::now()) {
                self.display_tick(tick).await?;
            }
            if self.schedule.power_report_due(Instant::now()) {
                self.power_report().await;
            }

            let wake = self.schedule.next_wakeup(Instant::now());
            tokio::select! {
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake)) => {}
                _ = shutdown.wait() => {}
            }
        }
    }

    /// Sample, evaluate, render and flush one frame.
    pub async fn display_tick(&mut self, tick: u64) -> Result<()> {
        let resample = tick % u64::from(self.resample_every.max(1)) == 0;
        let snapshot = self.build_snapshot(resample).await;
        let page = page_for_tick(&self.pages, tick, self.page_ticks);
        let frame = render(&snapshot, page, &self.icons, tick);
        self.sink.show(&frame).wrap_err("display write failed")?;
        tracing::debug!(tick, ?page, health = ?snapshot.health, "frame shown");

        let previous = self.last_snapshot.as_ref().map(|s| s.health);
        log_health_change(previous, snapshot.health, snapshot.throttle_bits);
        self.last_snapshot = Some(snapshot);
        Ok(())
    }

    /// Query the rails again and emit the console report.
    pub async fn power_report(&mut self) -> String {
        let sample = self.firmware.query_power().await;
        let report = format_report(&sample);
        tracing::info!(status = ?sample.status, total_w = sample.total_power_w(), "power report\n{report}");
        if self.print_power_report {
            println!("{report}");
        }
        report
    }

    async fn build_snapshot(&mut self, resample: bool) -> SystemSnapshot {
        let metrics = match (&self.last_metrics, resample) {
            (Some(previous), false) => previous.clone(),
            _ => {
                let fresh = self.sampler.sample();
                self.last_metrics = Some(fresh.clone());
                fresh
            }
        };
        let power = self.firmware.query_power().await;
        let throttle_bits = self.firmware.query_throttled().await;
        let health = evaluate(throttle_bits, &metrics, self.heat_limit_c);
        SystemSnapshot::new(metrics, power, throttle_bits, health)
    }
}

fn log_health_change(previous: Option<HealthState>, current: HealthState, bits: Option<u32>) {
    if previous == Some(current) {
        return;
    }
    let bits = bits.map(|b| format!("{b:#x}"));
    match current {
        HealthState::Ok if previous.is_some() => tracing::info!(?bits, "health back to normal"),
        HealthState::Ok => {}
        state => tracing::warn!(?state, ?bits, "health degraded"),
    }
}

/// One snapshot without any display, for `--once`.
pub async fn collect_once(config: &Config) -> SystemSnapshot {
    let mut sampler = Sampler::new(&config.sampler);
    let mut firmware = FirmwareClient::new(&config.firmware.vcgencmd, config.firmware_timeout());
    let metrics = sampler.sample();
    let power = firmware.query_power().await;
    let throttle_bits = firmware.query_throttled().await;
    let health = evaluate(throttle_bits, &metrics, config.sampler.heat_limit_c);
    SystemSnapshot::new(metrics, power, throttle_bits, health)
}
