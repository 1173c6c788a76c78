use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::OnceLock;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use oledmon::firmware::power::{PowerRails, PowerSample, RailReading};
use oledmon::health::HealthState;
use oledmon::render::frame::{HEIGHT, WIDTH};
use oledmon::render::icons::IconSet;
use oledmon::render::{Page, render, render_into};
use oledmon::system::snapshot::{InterfaceAddress, SampledMetrics, SystemSnapshot, Usage};
use proptest::prelude::*;

fn icons() -> &'static IconSet {
    static ICONS: OnceLock<IconSet> = OnceLock::new();
    ICONS.get_or_init(|| {
        IconSet::load(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/icons")).unwrap()
    })
}

/// Target much larger than the panel that counts lit pixels past 128x64.
struct OverflowProbe {
    overflow: usize,
}

impl OriginDimensions for OverflowProbe {
    fn size(&self) -> Size {
        Size::new(1024, 512)
    }
}

impl DrawTarget for OverflowProbe {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            let outside = p.x < 0 || p.y < 0 || p.x >= WIDTH as i32 || p.y >= HEIGHT as i32;
            if color.is_on() && outside {
                self.overflow += 1;
            }
        }
        Ok(())
    }
}

fn any_f32() -> impl Strategy<Value = Option<f32>> {
    prop_oneof![
        Just(None),
        Just(Some(f32::NAN)),
        Just(Some(f32::INFINITY)),
        Just(Some(-f32::INFINITY)),
        (-1.0e9f32..1.0e9).prop_map(Some),
    ]
}

fn any_f64() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        (0.0f64..1.0e13).prop_map(Some),
    ]
}

fn any_usage() -> impl Strategy<Value = Option<Usage>> {
    prop::option::of((any::<u64>(), any::<u64>()).prop_map(|(total, used)| Usage::new(total, used)))
}

fn any_addresses() -> impl Strategy<Value = Vec<InterfaceAddress>> {
    prop::collection::vec(
        ("[a-z0-9_.\\-]{1,24}", any::<u32>()).prop_map(|(interface, raw)| InterfaceAddress {
            interface,
            address: Ipv4Addr::from(raw),
        }),
        0..12,
    )
}

fn any_rails() -> impl Strategy<Value = PowerRails> {
    prop::collection::vec(("[A-Z0-9_]{1,30}", -100.0f64..100.0, -50.0f64..50.0), 0..16).prop_map(|rails| {
        let mut out = PowerRails::default();
        for (name, v, a) in rails {
            out.insert(&name, RailReading::new(v, a));
        }
        out
    })
}

fn any_power() -> impl Strategy<Value = PowerSample> {
    prop_oneof![
        any_rails().prop_map(PowerSample::available),
        Just(PowerSample::unsupported()),
        Just(PowerSample::timed_out()),
    ]
}

fn any_health() -> impl Strategy<Value = HealthState> {
    prop_oneof![
        Just(HealthState::Ok),
        Just(HealthState::ThrottledHeat),
        Just(HealthState::ThrottledVoltage),
        Just(HealthState::UnderVoltage),
    ]
}

prop_compose! {
    fn any_snapshot()(
        freq in any_f32(),
        usage in any_f32(),
        temp in any_f32(),
        memory in any_usage(),
        disk in any_usage(),
        addresses in any_addresses(),
        primary in prop::option::of(any::<u32>().prop_map(Ipv4Addr::from)),
        rates in (any_f64(), any_f64()),
        power in any_power(),
        bits in prop::option::of(any::<u32>()),
        health in any_health(),
    ) -> SystemSnapshot {
        let metrics = SampledMetrics {
            cpu_freq_mhz: freq,
            cpu_usage_pct: usage,
            cpu_temp_c: temp,
            memory,
            disk,
            ip_addresses: addresses,
            primary_address: primary,
            net_rx_bps: rates.0,
            net_tx_bps: rates.1,
        };
        SystemSnapshot::new(metrics, power, bits, health)
    }
}

fn any_page() -> impl Strategy<Value = Page> {
    prop_oneof![Just(Page::Overview), Just(Page::Network), Just(Page::Power)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn nothing_is_drawn_outside_the_panel(
        snapshot in any_snapshot(),
        page in any_page(),
        tick in any::<u64>(),
    ) {
        let mut probe = OverflowProbe { overflow: 0 };
        render_into(&mut probe, &snapshot, page, icons(), tick).unwrap();
        prop_assert_eq!(probe.overflow, 0);
    }

    #[test]
    fn equal_inputs_give_equal_frames(
        snapshot in any_snapshot(),
        page in any_page(),
        tick in any::<u64>(),
    ) {
        let a = render(&snapshot, page, icons(), tick);
        let b = render(&snapshot.clone(), page, icons(), tick);
        prop_assert_eq!(a, b);
    }
}
