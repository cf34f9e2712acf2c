//! Text layouts for the locally composed screens.

use super::{frame, Frame};
use crate::metrics::TemperatureUnit;
use crate::sensors::{pm_to_aqi, Quantity, Snapshot};
use crate::state::{RemoteSummaryState, SummaryField, SLOT_BYTES};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

const LINE_HEIGHT: i32 = 10;
const CHAR_WIDTH: i32 = 6;
const TOP: i32 = 2;
const MISSING: &str = "-";

/// AQI, particulates, CO2, gas indices and climate from the latest snapshot.
pub fn builtin_summary(snapshot: &Snapshot, unit: TemperatureUnit) -> Frame {
    let pm = snapshot.reading(Quantity::Pm25);
    let aqi = pm.map(|v| pm_to_aqi(v).to_string());
    let temperature = snapshot
        .reading(Quantity::Temperature)
        .map(|c| format!("{:.1}{}", unit.convert(c), unit_suffix(unit)));
    let humidity = snapshot
        .reading(Quantity::Humidity)
        .map(|rh| format!("{}%", rh as i64));

    let lines = [
        format!("AQI   {}", aqi.as_deref().unwrap_or(MISSING)),
        format!("PM2.5 {} ug/m3", whole(pm)),
        format!("CO2   {} ppm", whole(snapshot.reading(Quantity::Co2))),
        format!(
            "VOC {}  NOx {}",
            whole(snapshot.reading(Quantity::Voc)),
            whole(snapshot.reading(Quantity::Nox))
        ),
        format!(
            "{}  RH {}",
            temperature.as_deref().unwrap_or(MISSING),
            humidity.as_deref().unwrap_or(MISSING)
        ),
    ];
    draw_lines(&lines)
}

/// Power, water and garage fields pushed by the remote host.
pub fn remote_summary(summary: &RemoteSummaryState) -> Frame {
    let field = |f: SummaryField| summary.field(f);
    let lines = [
        format!("Power  {}", field(SummaryField::Watt)),
        format!("  avg  {}", field(SummaryField::WattAvg)),
        format!("Water  {}", field(SummaryField::Water)),
        format!("today  {}", field(SummaryField::WaterToday)),
        format!("Garage {}", field(SummaryField::Garage)),
        format!("       {}", field(SummaryField::GarageTime)),
    ];
    draw_lines(&lines)
}

pub fn custom_bitmap(bytes: &[u8; SLOT_BYTES]) -> Frame {
    Frame::from_xbm(bytes)
}

pub fn boot(device_id: &str) -> Frame {
    centered(&["airnode", device_id])
}

pub fn offline() -> Frame {
    centered(&["offline"])
}

fn unit_suffix(unit: TemperatureUnit) -> &'static str {
    match unit {
        TemperatureUnit::Celsius => "C",
        TemperatureUnit::Fahrenheit => "F",
    }
}

fn whole(value: Option<f64>) -> String {
    value
        .map(|v| (v as i64).to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(&FONT_6X10, BinaryColor::On)
}

fn draw_lines<S: AsRef<str>>(lines: &[S]) -> Frame {
    let mut frame = Frame::blank();
    for (row, line) in lines.iter().enumerate() {
        let origin = Point::new(0, TOP + row as i32 * LINE_HEIGHT);
        draw_text(&mut frame, line.as_ref(), origin);
    }
    frame
}

fn centered(lines: &[&str]) -> Frame {
    let mut frame = Frame::blank();
    let block = lines.len() as i32 * LINE_HEIGHT;
    let top = (frame::HEIGHT as i32 - block) / 2;
    for (row, line) in lines.iter().enumerate() {
        let width = line.chars().count() as i32 * CHAR_WIDTH;
        let x = ((frame::WIDTH as i32 - width) / 2).max(0);
        draw_text(&mut frame, line, Point::new(x, top + row as i32 * LINE_HEIGHT));
    }
    frame
}

fn draw_text(frame: &mut Frame, text: &str, origin: Point) {
    Text::with_baseline(text, origin, style(), Baseline::Top)
        .draw(frame)
        .unwrap_or_else(|never| match never {});
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SummaryUpdate;

    #[test]
    fn builtin_summary_draws_something_without_sensors() {
        let frame = builtin_summary(&Snapshot::empty(), TemperatureUnit::Celsius);
        assert!(!frame.is_blank());
    }

    #[test]
    fn builtin_summary_tracks_readings() {
        let a = Snapshot::empty().with_reading(Quantity::Co2, 410.0);
        let b = Snapshot::empty().with_reading(Quantity::Co2, 1210.0);
        assert_eq!(
            builtin_summary(&a, TemperatureUnit::Celsius),
            builtin_summary(&a, TemperatureUnit::Celsius)
        );
        assert_ne!(
            builtin_summary(&a, TemperatureUnit::Celsius),
            builtin_summary(&b, TemperatureUnit::Celsius)
        );
    }

    #[test]
    fn unit_changes_temperature_line() {
        let s = Snapshot::empty().with_reading(Quantity::Temperature, 21.0);
        assert_ne!(
            builtin_summary(&s, TemperatureUnit::Celsius),
            builtin_summary(&s, TemperatureUnit::Fahrenheit)
        );
    }

    #[test]
    fn remote_summary_shows_pushed_fields() {
        let mut summary = RemoteSummaryState::new(5_000);
        let empty = remote_summary(&summary);
        summary.apply_update(SummaryUpdate::default().with(SummaryField::Garage, "Shut"), 1);
        assert_ne!(remote_summary(&summary), empty);
    }

    #[test]
    fn custom_bitmap_is_shown_verbatim() {
        let mut raw = [0u8; SLOT_BYTES];
        raw[0] = 0xff;
        raw[SLOT_BYTES - 1] = 0x01;
        assert_eq!(custom_bitmap(&raw).as_bytes(), &raw);
    }

    #[test]
    fn offline_differs_from_boot() {
        assert!(!offline().is_blank());
        assert_ne!(offline(), boot("hall"));
    }
}
