use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;

pub mod loader;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9926;
pub const DEFAULT_DEVICE_ID: &str = "airnode";
pub const DEFAULT_PM_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_CO2_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_GAS_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_CLIMATE_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_DISPLAY_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_MIN_DISPLAY_INTERVAL_MS: u64 = 500;
pub const DEFAULT_SLOT_MAX_AGE_MS: u64 = 300_000;
pub const DEFAULT_SUMMARY_MAX_AGE_MS: u64 = 300_000;
pub const DEFAULT_I2C_BUS: u8 = 1;
pub const DEFAULT_OLED_ADDR: u8 = 0x3c;
const CONFIG_DIR_NAME: &str = ".airnode";
const CONFIG_FILE_NAME: &str = "config.toml";

/// User-supplied settings loaded from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub device_id: String,
    pub net_interface: Option<String>,
    pub fahrenheit: bool,
    pub pm_interval_ms: u64,
    pub co2_interval_ms: u64,
    pub gas_interval_ms: u64,
    pub climate_interval_ms: u64,
    pub display_interval_ms: u64,
    pub min_display_interval_ms: u64,
    pub slot_max_age_ms: u64,
    pub summary_max_age_ms: u64,
    pub pms_device: Option<String>,
    pub co2_device: Option<String>,
    pub i2c_bus: u8,
    pub sht_addr: Option<u8>,
    pub oled_addr: Option<u8>,
    pub telemetry_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            device_id: DEFAULT_DEVICE_ID.to_string(),
            net_interface: None,
            fahrenheit: false,
            pm_interval_ms: DEFAULT_PM_INTERVAL_MS,
            co2_interval_ms: DEFAULT_CO2_INTERVAL_MS,
            gas_interval_ms: DEFAULT_GAS_INTERVAL_MS,
            climate_interval_ms: DEFAULT_CLIMATE_INTERVAL_MS,
            display_interval_ms: DEFAULT_DISPLAY_INTERVAL_MS,
            min_display_interval_ms: DEFAULT_MIN_DISPLAY_INTERVAL_MS,
            slot_max_age_ms: DEFAULT_SLOT_MAX_AGE_MS,
            summary_max_age_ms: DEFAULT_SUMMARY_MAX_AGE_MS,
            pms_device: None,
            co2_device: None,
            i2c_bus: DEFAULT_I2C_BUS,
            sht_addr: None,
            oled_addr: Some(DEFAULT_OLED_ADDR),
            telemetry_path: None,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        loader::load_or_default()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        loader::load_from_path(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        loader::save_to_path(self, path)
    }
}

fn validate(cfg: &Config) -> Result<()> {
    if cfg.port == 0 {
        return Err(Error::InvalidArgs("port must be between 1 and 65535".into()));
    }
    if cfg.device_id.is_empty()
        || cfg
            .device_id
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_control())
    {
        return Err(Error::InvalidArgs(
            "device_id must be non-empty and must not contain quotes, backslashes or control characters"
                .into(),
        ));
    }
    for (name, value) in [
        ("pm_interval", cfg.pm_interval_ms),
        ("co2_interval", cfg.co2_interval_ms),
        ("gas_interval", cfg.gas_interval_ms),
        ("climate_interval", cfg.climate_interval_ms),
        ("min_display_interval", cfg.min_display_interval_ms),
        ("slot_max_age", cfg.slot_max_age_ms),
        ("summary_max_age", cfg.summary_max_age_ms),
    ] {
        if value == 0 {
            return Err(Error::InvalidArgs(format!("{name} must be greater than zero")));
        }
    }
    if cfg.display_interval_ms < cfg.min_display_interval_ms {
        return Err(Error::InvalidArgs(format!(
            "display_interval must be at least min_display_interval ({}ms)",
            cfg.min_display_interval_ms
        )));
    }
    Ok(())
}

/// Accepts plain milliseconds (`5000`) or a humantime duration (`5s`, `1m 30s`).
fn parse_duration_ms(raw: &str) -> std::result::Result<u64, String> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<u64>().map_err(|e| e.to_string());
    }
    humantime::parse_duration(raw)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

fn format_duration_ms(ms: u64) -> String {
    format!("\"{}\"", humantime::format_duration(Duration::from_millis(ms)))
}

fn parse_i2c_addr(raw: &str) -> std::result::Result<u8, String> {
    let value = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse::<u8>(),
    }
    .map_err(|_| "expected a hex or decimal I2C address (e.g., 0x3c)".to_string())?;
    if value > 0x7f {
        return Err("I2C addresses are 7-bit (0x00..=0x7f)".into());
    }
    Ok(value)
}

fn format_i2c_addr(addr: Option<u8>) -> String {
    match addr {
        Some(a) => format!("\"{a:#04x}\""),
        None => "null".into(),
    }
}
