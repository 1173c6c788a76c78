use std::path::Path;

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_temperature(zone: &Path) -> Option<f32> {
        // sysfs reports millidegrees Celsius, e.g. "48312\n"
        let contents = std::fs::read_to_string(zone).ok()?;
        parse_millidegrees(&contents)
    }
}

fn parse_millidegrees(contents: &str) -> Option<f32> {
    let milli: i64 = contents.trim().parse().ok()?;
    Some(milli as f32 / 1000.0)
}
