/// Parse `throttled=0x50005` (the `vcgencmd get_throttled` reply) into the
/// raw mask. A bare value is accepted as well.
pub fn parse_throttled(output: &str) -> Option<u32> {
    let line = output.lines().find(|l| !l.trim().is_empty())?.trim();
    let value = match line.split_once('=') {
        Some((key, value)) if key.trim().eq_ignore_ascii_case("throttled") => value.trim(),
        Some(_) => return None,
        None => line,
    };

    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
