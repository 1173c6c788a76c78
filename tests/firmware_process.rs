//! Drives `FirmwareClient` against throwaway shell scripts standing in for
//! `vcgencmd`.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use oledmon::firmware::FirmwareClient;
use oledmon::firmware::power::PowerStatus;

/// Writing a script while another test forks can leave it busy (ETXTBSY),
/// so the tests in this file take turns.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn fake_tool(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("oledmon-fw-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("vcgencmd");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test(flavor = "current_thread")]
async fn reads_rails_and_throttle_bits() {
    let _serial = serial();
    let tool = fake_tool(
        "ok",
        r#"case "$1" in
  pmic_read_adc)
    echo "   EXT5V_V volt(24)=5.10000000V"
    echo "   EXT5V_A current(24)=0.60000000A"
    echo "   VDD_CORE_V volt(15)=0.85000000V"
    echo "   VDD_CORE_A current(7)=1.20000000A"
    echo "   BATT_V volt(25)=3.00000000V"
    ;;
  get_throttled) echo "throttled=0x50005" ;;
esac"#,
    );
    let mut client = FirmwareClient::new(&tool, Duration::from_secs(2));

    let power = client.query_power().await;
    assert_eq!(power.status, PowerStatus::Available);
    let names: Vec<&str> = power.rails.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["EXT5V", "VDD_CORE"]);
    assert!((power.total_power_w() - (5.1 * 0.6 + 0.85 * 1.2)).abs() < 1e-9);

    assert_eq!(client.query_throttled().await, Some(0x50005));
}

#[tokio::test(flavor = "current_thread")]
async fn slow_tool_times_out_without_latching() {
    let _serial = serial();
    let tool = fake_tool("slow", "sleep 5");
    let mut client = FirmwareClient::new(&tool, Duration::from_millis(200));

    let started = Instant::now();
    let power = client.query_power().await;
    assert_eq!(power.status, PowerStatus::TimedOut);
    assert!(power.rails.is_empty());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(client.power_supported());
}

#[tokio::test(flavor = "current_thread")]
async fn failing_tool_latches_unsupported() {
    let _serial = serial();
    let tool = fake_tool("fail", "echo 'error=1' >&2; exit 255");
    let mut client = FirmwareClient::new(&tool, Duration::from_secs(2));

    assert_eq!(client.query_power().await.status, PowerStatus::Unsupported);
    assert!(!client.power_supported());
    assert_eq!(client.query_throttled().await, None);
}

#[tokio::test(flavor = "current_thread")]
async fn empty_pmic_output_is_unsupported() {
    let _serial = serial();
    let tool = fake_tool("empty", "echo ''");
    let mut client = FirmwareClient::new(&tool, Duration::from_secs(2));

    let power = client.query_power().await;
    assert_eq!(power.status, PowerStatus::Unsupported);
    assert_eq!(power.total_power_w(), 0.0);
    assert!(!client.power_supported());
}
