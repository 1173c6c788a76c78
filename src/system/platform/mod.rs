use std::path::Path;

pub trait PlatformExtensions {
    /// CPU temperature in °C from a kernel thermal zone.
    fn cpu_temperature(zone: &Path) -> Option<f32>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod generic;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use generic as platform_impl;

pub fn cpu_temperature(zone: &Path) -> Option<f32> {
    platform_impl::Platform::cpu_temperature(zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_zone_is_unavailable() {
        assert_eq!(cpu_temperature(Path::new("/nonexistent/thermal_zone9/temp")), None);
    }
}
