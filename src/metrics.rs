//! Prometheus text exposition of the latest readings.

use crate::sensors::{pm_to_aqi, Quantity, Snapshot};
use std::fs;
use std::path::Path;

const SYS_NET: &str = "/sys/class/net";

/// Static labels attached to every sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub mac: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, mac: Option<String>) -> Self {
        Self { id: id.into(), mac }
    }

    /// Resolve the MAC label from sysfs. Without an explicit interface the first
    /// non-loopback one (by name) is used. The label is dropped when nothing is found.
    pub fn detect(id: &str, interface: Option<&str>) -> Self {
        Self::detect_in(Path::new(SYS_NET), id, interface)
    }

    fn detect_in(root: &Path, id: &str, interface: Option<&str>) -> Self {
        let mac = match interface {
            Some(name) => read_mac(root, name),
            None => first_interface(root).and_then(|name| read_mac(root, &name)),
        };
        Self::new(id, mac)
    }

    fn labels(&self) -> String {
        match &self.mac {
            Some(mac) => format!("{{id=\"{}\",mac=\"{}\"}}", self.id, mac),
            None => format!("{{id=\"{}\"}}", self.id),
        }
    }
}

fn read_mac(root: &Path, interface: &str) -> Option<String> {
    let raw = fs::read_to_string(root.join(interface).join("address")).ok()?;
    let mac = raw.trim();
    (!mac.is_empty() && mac != "00:00:00:00:00:00").then(|| mac.to_string())
}

fn first_interface(root: &Path) -> Option<String> {
    let mut names: Vec<String> = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name != "lo")
        .collect();
    names.sort();
    names.into_iter().find(|name| read_mac(root, name).is_some())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_fahrenheit_flag(fahrenheit: bool) -> Self {
        if fahrenheit {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }

    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        }
    }
}

/// Render the scrape body. Ordering is fixed; a quantity without a sensor or
/// with a negative value is left out, `uptimesec` is always present.
pub fn format_metrics(
    snapshot: &Snapshot,
    identity: &Identity,
    uptime_secs: u64,
    unit: TemperatureUnit,
) -> String {
    let labels = identity.labels();
    let mut out = String::with_capacity(1024);

    if let Some(pm) = snapshot.reading(Quantity::Pm25) {
        gauge(
            &mut out,
            "aqi",
            "Air quality index from PM2.5",
            &labels,
            pm_to_aqi(pm).to_string(),
        );
        gauge(
            &mut out,
            "pm025",
            "Particulate matter PM2.5, in ug/m3",
            &labels,
            int(pm),
        );
    }
    if let Some(nox) = snapshot.reading(Quantity::Nox) {
        gauge(&mut out, "nox", "NOx index", &labels, int(nox));
    }
    if let Some(voc) = snapshot.reading(Quantity::Voc) {
        gauge(
            &mut out,
            "tvoc",
            "Total volatile organic compounds index",
            &labels,
            int(voc),
        );
    }
    if let Some(co2) = snapshot.reading(Quantity::Co2) {
        gauge(&mut out, "rco2", "CO2, in ppm", &labels, int(co2));
    }
    if let Some(celsius) = snapshot.reading(Quantity::Temperature) {
        let help = format!("Temperature, in degrees {}", unit.name());
        gauge(
            &mut out,
            "atmp",
            &help,
            &labels,
            format!("{:.2}", unit.convert(celsius)),
        );
    }
    if let Some(rh) = snapshot.reading(Quantity::Humidity) {
        gauge(
            &mut out,
            "rhum",
            "Relative humidity, in percent",
            &labels,
            int(rh),
        );
    }
    gauge(
        &mut out,
        "uptimesec",
        "Uptime, in seconds",
        &labels,
        uptime_secs.to_string(),
    );

    out
}

fn int(value: f64) -> String {
    (value as i64).to_string()
}

fn gauge(out: &mut String, name: &str, help: &str, labels: &str, value: String) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} gauge\n"));
    out.push_str(&format!("{name}{labels} {value}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn identity() -> Identity {
        Identity::new("hall", Some("b8:27:eb:00:00:01".into()))
    }

    fn sample_names(body: &str) -> Vec<&str> {
        body.lines()
            .filter(|l| !l.starts_with('#'))
            .filter_map(|l| l.split('{').next())
            .collect()
    }

    #[test]
    fn uptime_is_always_emitted() {
        let body = format_metrics(
            &Snapshot::empty(),
            &identity(),
            642,
            TemperatureUnit::Celsius,
        );
        assert_eq!(
            body,
            "# HELP uptimesec Uptime, in seconds\n\
             # TYPE uptimesec gauge\n\
             uptimesec{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 642\n"
        );
    }

    #[test]
    fn fixed_order_with_all_sensors() {
        let snapshot = Snapshot::empty()
            .with_reading(Quantity::Pm25, 12.0)
            .with_reading(Quantity::Co2, 624.0)
            .with_reading(Quantity::Voc, 102.0)
            .with_reading(Quantity::Nox, 1.0)
            .with_reading(Quantity::Temperature, 20.4)
            .with_reading(Quantity::Humidity, 62.7);
        let body = format_metrics(&snapshot, &identity(), 5, TemperatureUnit::Celsius);
        assert_eq!(
            sample_names(&body),
            vec!["aqi", "pm025", "nox", "tvoc", "rco2", "atmp", "rhum", "uptimesec"]
        );
        assert!(body.contains("aqi{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 48\n"));
        assert!(body.contains("rco2{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 624\n"));
        assert!(body.contains("atmp{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 20.40\n"));
        assert!(body.contains("rhum{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 62\n"));
        assert!(body.contains("# TYPE tvoc gauge\n"));
    }

    #[test]
    fn negative_or_missing_values_are_omitted() {
        let snapshot = Snapshot::empty()
            .with_reading(Quantity::Pm25, -1.0)
            .with_reading(Quantity::Co2, 410.0);
        let body = format_metrics(&snapshot, &identity(), 1, TemperatureUnit::Celsius);
        assert_eq!(sample_names(&body), vec!["rco2", "uptimesec"]);
        assert!(!body.contains("aqi"));
    }

    #[test]
    fn fahrenheit_conversion_uses_two_decimals() {
        let snapshot = Snapshot::empty().with_reading(Quantity::Temperature, 20.4);
        let body = format_metrics(&snapshot, &identity(), 1, TemperatureUnit::Fahrenheit);
        assert!(body.contains("atmp{id=\"hall\",mac=\"b8:27:eb:00:00:01\"} 68.72\n"), "{body}");
        assert!(body.contains("degrees Fahrenheit"));
    }

    #[test]
    fn mac_label_is_optional() {
        let body = format_metrics(
            &Snapshot::empty(),
            &Identity::new("solo", None),
            0,
            TemperatureUnit::Celsius,
        );
        assert!(body.contains("uptimesec{id=\"solo\"} 0\n"));
    }

    #[test]
    fn detects_mac_from_sysfs_layout() {
        let dir = tempdir().unwrap();
        for (name, mac) in [
            ("lo", "00:00:00:00:00:00"),
            ("wlan0", "aa:bb:cc:dd:ee:ff"),
            ("eth0", "11:22:33:44:55:66"),
        ] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
            fs::write(dir.path().join(name).join("address"), format!("{mac}\n")).unwrap();
        }

        let explicit = Identity::detect_in(dir.path(), "n", Some("wlan0"));
        assert_eq!(explicit.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));

        let auto = Identity::detect_in(dir.path(), "n", None);
        assert_eq!(auto.mac.as_deref(), Some("11:22:33:44:55:66"));

        let missing = Identity::detect_in(dir.path(), "n", Some("usb9"));
        assert_eq!(missing.mac, None);
    }
}
