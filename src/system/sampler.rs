use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Instant;

use sysinfo::{Components, Disks, Networks, System};

use super::platform;
use super::snapshot::{InterfaceAddress, SampledMetrics, Usage};
use crate::config::SamplerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    CpuUsage,
    CpuFrequency,
    CpuTemperature,
    Memory,
    Disk,
    Network,
    PrimaryRoute,
}

/// Logs a failing source once when it starts failing and once when it recovers.
#[derive(Debug, Default)]
struct FailureLog {
    failing: HashSet<Source>,
}

impl FailureLog {
    fn observe<T>(&mut self, source: Source, value: Option<T>) -> Option<T> {
        let was_failing = self.failing.contains(&source);
        match (value.is_some(), was_failing) {
            (false, false) => {
                tracing::warn!(?source, "metric source unavailable");
                self.failing.insert(source);
            }
            (false, true) => tracing::debug!(?source, "metric source still unavailable"),
            (true, true) => {
                tracing::info!(?source, "metric source recovered");
                self.failing.remove(&source);
            }
            (true, false) => {}
        }
        value
    }
}

#[derive(Clone, Copy, Debug)]
struct Counters {
    rx_bytes: u64,
    tx_bytes: u64,
    at: Instant,
}

/// Point-in-time OS metrics. Owns the sysinfo handles and the previous
/// network counters needed for throughput.
pub struct Sampler {
    sys: System,
    networks: Networks,
    disks: Disks,
    components: Components,
    disk_mount: PathBuf,
    thermal_zone: PathBuf,
    route_probe: Option<SocketAddr>,
    last_counters: Option<Counters>,
    failures: FailureLog,
}

impl Sampler {
    pub fn new(config: &SamplerConfig) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        Sampler {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            disk_mount: config.disk_mount.clone(),
            thermal_zone: config.thermal_zone.clone(),
            route_probe: config
                .probe_primary_route
                .then_some(config.route_probe),
            last_counters: None,
            failures: FailureLog::default(),
        }
    }

    /// One pass over every source. A source that fails only blanks its own fields.
    pub fn sample(&mut self) -> SampledMetrics {
        let _span = tracing::debug_span!("sampler.sample").entered();

        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();
        self.disks.refresh(true);
        self.networks.refresh(true);

        let cpu_usage_pct = self.cpu_usage();
        let cpu_usage_pct = self.failures.observe(Source::CpuUsage, cpu_usage_pct);
        let cpu_freq_mhz = self.cpu_frequency();
        let cpu_freq_mhz = self.failures.observe(Source::CpuFrequency, cpu_freq_mhz);
        let cpu_temp_c = self.cpu_temperature();
        let cpu_temp_c = self.failures.observe(Source::CpuTemperature, cpu_temp_c);
        let memory = self.memory();
        let memory = self.failures.observe(Source::Memory, memory);
        let disk = self.disk();
        let disk = self.failures.observe(Source::Disk, disk);

        let ip_addresses = collect_addresses(self.networks.iter().map(|(name, data)| {
            (
                name.as_str(),
                data.ip_networks().iter().map(|n| n.addr).collect::<Vec<_>>(),
            )
        }));

        let rates = self.throughput();
        let rates = self.failures.observe(Source::Network, rates);
        let (net_rx_bps, net_tx_bps) = rates.unzip();

        let primary_address = match self.route_probe {
            Some(probe) => {
                let address = primary_route_address(probe);
                self.failures.observe(Source::PrimaryRoute, address)
            }
            None => None,
        };

        SampledMetrics {
            cpu_freq_mhz,
            cpu_usage_pct,
            cpu_temp_c,
            memory,
            disk,
            ip_addresses,
            primary_address,
            net_rx_bps,
            net_tx_bps,
        }
    }

    fn cpu_usage(&self) -> Option<f32> {
        if self.sys.cpus().is_empty() {
            return None;
        }
        let usage = self.sys.global_cpu_usage();
        usage.is_finite().then_some(usage)
    }

    fn cpu_frequency(&self) -> Option<f32> {
        let mhz = self.sys.cpus().first()?.frequency();
        (mhz > 0).then_some(mhz as f32)
    }

    fn cpu_temperature(&mut self) -> Option<f32> {
        if let Some(temp) = platform::cpu_temperature(&self.thermal_zone) {
            return Some(temp);
        }
        self.components.refresh(true);
        self.components.iter().find_map(|c| c.temperature())
    }

    fn memory(&self) -> Option<Usage> {
        let total = self.sys.total_memory();
        (total > 0).then(|| Usage::new(total, self.sys.used_memory()))
    }

    fn disk(&self) -> Option<Usage> {
        let mounts: Vec<(&Path, u64, u64)> = self
            .disks
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()))
            .collect();
        let (_, total, available) = select_disk(&mounts, &self.disk_mount)?;
        Some(Usage::new(total, total.saturating_sub(available)))
    }

    fn throughput(&mut self) -> Option<(f64, f64)> {
        if self.networks.is_empty() {
            self.last_counters = None;
            return None;
        }
        let (rx_bytes, tx_bytes) = self
            .networks
            .iter()
            .filter(|(name, _)| !is_loopback_interface(name))
            .fold((0u64, 0u64), |(rx, tx), (_, data)| {
                (
                    rx.saturating_add(data.total_received()),
                    tx.saturating_add(data.total_transmitted()),
                )
            });
        let now = Counters {
            rx_bytes,
            tx_bytes,
            at: Instant::now(),
        };
        let previous = self.last_counters.replace(now);
        match previous {
            Some(previous) => bits_per_second(&previous, &now),
            // First pass primes the counters.
            None => Some((0.0, 0.0)),
        }
    }
}

fn bits_per_second(previous: &Counters, now: &Counters) -> Option<(f64, f64)> {
    let secs = now.at.checked_duration_since(previous.at)?.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let rx = now.rx_bytes.saturating_sub(previous.rx_bytes) as f64 * 8.0 / secs;
    let tx = now.tx_bytes.saturating_sub(previous.tx_bytes) as f64 * 8.0 / secs;
    Some((rx, tx))
}

fn is_loopback_interface(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0")
}

/// Routable IPv4 addresses, ordered by interface name. Loopback and
/// link-local addresses are skipped.
pub fn collect_addresses<'a, I>(interfaces: I) -> Vec<InterfaceAddress>
where
    I: IntoIterator<Item = (&'a str, Vec<IpAddr>)>,
{
    let mut out: Vec<InterfaceAddress> = interfaces
        .into_iter()
        .flat_map(|(name, addrs)| {
            addrs.into_iter().filter_map(move |addr| match addr {
                IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified() => {
                    Some(InterfaceAddress {
                        interface: name.to_string(),
                        address: v4,
                    })
                }
                _ => None,
            })
        })
        .collect();
    out.sort_by(|a, b| a.interface.cmp(&b.interface).then(a.address.cmp(&b.address)));
    out
}

/// The disk whose mount point is the longest prefix of `target`.
pub fn select_disk<'a>(mounts: &[(&'a Path, u64, u64)], target: &Path) -> Option<(&'a Path, u64, u64)> {
    mounts
        .iter()
        .filter(|(mount, total, _)| *total > 0 && target.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.components().count())
        .copied()
}

/// Source address the kernel would use for the default route. Connecting a
/// UDP socket sends nothing.
pub fn primary_route_address(probe: SocketAddr) -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).ok()?;
    socket.connect(probe).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(v4) if !v4.is_unspecified() => Some(v4),
        _ => None,
    }
}
