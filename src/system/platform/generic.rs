use std::path::Path;

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    // No sysfs thermal zones; the sampler falls back to sysinfo components.
    fn cpu_temperature(_zone: &Path) -> Option<f32> {
        None
    }
}
