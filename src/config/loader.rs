use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

use super::{Config, CONFIG_DIR_NAME, CONFIG_FILE_NAME};

pub fn load_or_default() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        cfg.save_to_path(&path)?;
        super::validate(&cfg)?;
        return Ok(cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        super::validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path)?;
    parse(&raw)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = format!(
        "# airnode config\n\
bind = \"{}\"\n\
port = {}\n\
device_id = \"{}\"\n\
net_interface = {}\n\
fahrenheit = {}\n\
pm_interval = {}\n\
co2_interval = {}\n\
gas_interval = {}\n\
climate_interval = {}\n\
display_interval = {}\n\
min_display_interval = {}\n\
slot_max_age = {}\n\
summary_max_age = {}\n\
pms_device = {}\n\
co2_device = {}\n\
i2c_bus = {}\n\
sht_addr = {}\n\
oled_addr = {}\n\
telemetry_path = {}\n",
        config.bind,
        config.port,
        config.device_id,
        format_optional_string(config.net_interface.as_deref()),
        config.fahrenheit,
        super::format_duration_ms(config.pm_interval_ms),
        super::format_duration_ms(config.co2_interval_ms),
        super::format_duration_ms(config.gas_interval_ms),
        super::format_duration_ms(config.climate_interval_ms),
        super::format_duration_ms(config.display_interval_ms),
        super::format_duration_ms(config.min_display_interval_ms),
        super::format_duration_ms(config.slot_max_age_ms),
        super::format_duration_ms(config.summary_max_age_ms),
        format_optional_string(config.pms_device.as_deref()),
        format_optional_string(config.co2_device.as_deref()),
        config.i2c_bus,
        super::format_i2c_addr(config.sht_addr),
        super::format_i2c_addr(config.oled_addr),
        format_optional_string(config.telemetry_path.as_deref()),
    );
    fs::write(path, contents)?;
    Ok(())
}

pub fn parse(raw: &str) -> Result<Config> {
    let mut cfg = Config::default();

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            Error::InvalidArgs(format!("invalid config line {}: '{}'", idx + 1, line))
        })?;

        let key = key.trim();
        let value = value.trim().trim_matches('"');
        let line_no = idx + 1;
        match key {
            "bind" => cfg.bind = value.to_string(),
            "port" => {
                cfg.port = value.parse().map_err(|_| {
                    Error::InvalidArgs(format!("invalid port value on line {line_no}"))
                })?;
            }
            "device_id" => cfg.device_id = value.to_string(),
            "net_interface" => cfg.net_interface = optional_string(value),
            "fahrenheit" => {
                cfg.fahrenheit = value.parse().map_err(|_| {
                    Error::InvalidArgs(format!(
                        "invalid fahrenheit value on line {line_no}: expected true or false"
                    ))
                })?;
            }
            "pm_interval" => cfg.pm_interval_ms = duration(key, value, line_no)?,
            "co2_interval" => cfg.co2_interval_ms = duration(key, value, line_no)?,
            "gas_interval" => cfg.gas_interval_ms = duration(key, value, line_no)?,
            "climate_interval" => cfg.climate_interval_ms = duration(key, value, line_no)?,
            "display_interval" => cfg.display_interval_ms = duration(key, value, line_no)?,
            "min_display_interval" => {
                cfg.min_display_interval_ms = duration(key, value, line_no)?;
            }
            "slot_max_age" => cfg.slot_max_age_ms = duration(key, value, line_no)?,
            "summary_max_age" => cfg.summary_max_age_ms = duration(key, value, line_no)?,
            "pms_device" => cfg.pms_device = optional_string(value),
            "co2_device" => cfg.co2_device = optional_string(value),
            "i2c_bus" => {
                cfg.i2c_bus = value.parse().map_err(|_| {
                    Error::InvalidArgs(format!("invalid i2c_bus value on line {line_no}"))
                })?;
            }
            "sht_addr" => cfg.sht_addr = i2c_addr(key, value, line_no)?,
            "oled_addr" => cfg.oled_addr = i2c_addr(key, value, line_no)?,
            "telemetry_path" => cfg.telemetry_path = optional_string(value),
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown config key '{}' on line {}",
                    other, line_no
                )));
            }
        }
    }

    super::validate(&cfg)?;
    Ok(cfg)
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidArgs("HOME not set; cannot locate config directory".into()))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn duration(key: &str, value: &str, line_no: usize) -> Result<u64> {
    super::parse_duration_ms(value)
        .map_err(|e| Error::InvalidArgs(format!("invalid {key} on line {line_no}: {e}")))
}

fn i2c_addr(key: &str, value: &str, line_no: usize) -> Result<Option<u8>> {
    if value == "null" {
        return Ok(None);
    }
    super::parse_i2c_addr(value)
        .map(Some)
        .map_err(|e| Error::InvalidArgs(format!("invalid {key} on line {line_no}: {e}")))
}

fn optional_string(value: &str) -> Option<String> {
    if value == "null" || value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn format_optional_string(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{v}\""),
        None => "null".into(),
    }
}
