use crate::{
    cli::RunOptions,
    config::{
        Config, DEFAULT_BIND, DEFAULT_CLIMATE_INTERVAL_MS, DEFAULT_CO2_INTERVAL_MS,
        DEFAULT_DEVICE_ID, DEFAULT_DISPLAY_INTERVAL_MS, DEFAULT_GAS_INTERVAL_MS, DEFAULT_I2C_BUS,
        DEFAULT_MIN_DISPLAY_INTERVAL_MS, DEFAULT_OLED_ADDR, DEFAULT_PM_INTERVAL_MS, DEFAULT_PORT,
        DEFAULT_SLOT_MAX_AGE_MS, DEFAULT_SUMMARY_MAX_AGE_MS,
    },
    display::{screens, MemoryPanel, Panel},
    http::HttpServer,
    metrics::{Identity, TemperatureUnit},
    node::{Node, NodeSettings},
    sensors::{pms5003, senseair_s8, uart, SamplerIntervals, SensorSampler},
    Result,
};
use std::{path::Path, str::FromStr};

mod demo;
mod lifecycle;
pub mod logger;
mod poll_loop;
mod telemetry;

use demo::SimulatedSensor;
use lifecycle::create_shutdown_flag;
pub use logger::{LogLevel, Logger};
use poll_loop::{run_poll_loop, PollContext};
use telemetry::Telemetry;

/// Config for the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
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
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub demo: bool,
}

impl Default for AppConfig {
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
            log_level: LogLevel::default(),
            log_file: None,
            demo: false,
        }
    }
}

pub struct App {
    config: AppConfig,
    logger: Logger,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let logger = Logger::new(config.log_level, config.log_file.clone());
        Ok(Self { config, logger })
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let cfg_file = match opts.config_path.as_deref() {
            Some(path) => Config::load_from_path(Path::new(path))?,
            None => Config::load_or_default()?,
        };
        let merged = AppConfig::from_sources(cfg_file, opts);
        Self::new(merged)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Entry point for the daemon. Wires sensors, panel and listener, then polls until ctrl-c.
    pub fn run(&self) -> Result<()> {
        let config = &self.config;
        self.logger.info(format!(
            "daemon start (id={}, bind={}:{}, demo={})",
            config.device_id, config.bind, config.port, config.demo
        ));

        let server = HttpServer::bind(&config.bind, config.port)?;
        let mut node = self.build_node();
        let mut panel = self.open_panel();
        if let Err(err) = panel.show(&screens::boot(&config.device_id)) {
            self.logger.warn(format!("boot screen failed: {err}"));
        }

        let mut telemetry = match config.telemetry_path.as_deref() {
            Some(path) => Telemetry::open(Path::new(path)).unwrap_or_else(|err| {
                self.logger
                    .warn(format!("telemetry disabled: cannot open {path}: {err}"));
                Telemetry::disabled()
            }),
            None => Telemetry::disabled(),
        };

        self.logger.info(format!(
            "serving metrics on http://{} with {} driver(s) and {} panel",
            server.local_addr()?,
            node.sampler.driver_names().len(),
            panel.name()
        ));

        let running = create_shutdown_flag()?;
        let mut ctx = PollContext {
            node: &mut node,
            panel: panel.as_mut(),
            server: &server,
            telemetry: &mut telemetry,
            logger: &self.logger,
        };
        run_poll_loop(&mut ctx, running)
    }

    fn build_node(&self) -> Node {
        let config = &self.config;
        let mut sampler = SensorSampler::new(config.sampler_intervals());
        if config.demo {
            self.logger
                .info("demo mode enabled: simulating every sensor");
            sampler.attach(Box::new(SimulatedSensor::new()));
        } else {
            self.attach_hardware(&mut sampler);
        }

        let identity = Identity::detect(&config.device_id, config.net_interface.as_deref());
        match &identity.mac {
            Some(mac) => self.logger.debug(format!("mac label {mac}")),
            None => self.logger.info("no usable network interface; omitting mac label"),
        }
        Node::new(
            sampler,
            identity,
            config.node_settings(),
            config.display_interval_ms,
        )
    }

    fn attach_hardware(&self, sampler: &mut SensorSampler) {
        let config = &self.config;
        if let Some(device) = config.pms_device.as_deref() {
            let driver = uart::open(device, pms5003::BAUD).and_then(pms5003::Pms5003::new);
            match driver {
                Ok(driver) => self.report_attach(device, sampler.attach(Box::new(driver))),
                Err(err) => self.logger.warn(format!("pms5003 on {device}: {err}")),
            }
        }

        if let Some(device) = config.co2_device.as_deref() {
            match uart::open(device, senseair_s8::BAUD) {
                Ok(port) => {
                    let driver = senseair_s8::SenseairS8::new(port);
                    self.report_attach(device, sampler.attach(Box::new(driver)));
                }
                Err(err) => self.logger.warn(format!("senseair_s8 on {device}: {err}")),
            }
        }

        if let Some(addr) = config.sht_addr {
            self.attach_sht3x(sampler, addr);
        }
    }

    #[cfg(target_os = "linux")]
    fn attach_sht3x(&self, sampler: &mut SensorSampler, addr: u8) {
        use crate::hal::{open_i2c, StdDelay};
        use crate::sensors::sht3x::Sht3x;

        let bus = self.config.i2c_bus;
        match open_i2c(bus) {
            Ok(i2c) => {
                let driver = Sht3x::new(i2c, StdDelay, addr);
                self.report_attach(
                    &format!("i2c-{bus}@{addr:#04x}"),
                    sampler.attach(Box::new(driver)),
                );
            }
            Err(err) => self.logger.warn(format!("sht3x at {addr:#04x}: {err}")),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn attach_sht3x(&self, _sampler: &mut SensorSampler, addr: u8) {
        self.logger.warn(format!(
            "sht3x at {addr:#04x}: I2C sensors are only supported on Linux"
        ));
    }

    fn report_attach(&self, source: &str, claimed: Vec<crate::sensors::Quantity>) {
        if claimed.is_empty() {
            self.logger
                .warn(format!("{source}: every quantity already has a driver; skipped"));
        } else {
            let names: Vec<&str> = claimed.iter().map(|q| q.as_str()).collect();
            self.logger
                .info(format!("{source}: serving {}", names.join(", ")));
        }
    }

    #[cfg(target_os = "linux")]
    fn open_panel(&self) -> Box<dyn Panel> {
        let Some(addr) = self.config.oled_addr else {
            self.logger.info("no oled_addr configured; running headless");
            return Box::new(MemoryPanel::new());
        };
        match crate::display::oled::open(self.config.i2c_bus, addr) {
            Ok(panel) => Box::new(panel),
            Err(err) => {
                self.logger
                    .warn(format!("oled unavailable, running headless: {err}"));
                Box::new(MemoryPanel::new())
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn open_panel(&self) -> Box<dyn Panel> {
        if self.config.oled_addr.is_some() {
            self.logger
                .warn("OLED panels are only supported on Linux; running headless");
        }
        Box::new(MemoryPanel::new())
    }
}

impl AppConfig {
    pub fn from_sources(config: Config, opts: RunOptions) -> Self {
        Self {
            bind: opts.bind.unwrap_or(config.bind),
            port: opts.port.unwrap_or(config.port),
            device_id: opts.device_id.unwrap_or(config.device_id),
            net_interface: config.net_interface,
            fahrenheit: config.fahrenheit,
            pm_interval_ms: config.pm_interval_ms,
            co2_interval_ms: config.co2_interval_ms,
            gas_interval_ms: config.gas_interval_ms,
            climate_interval_ms: config.climate_interval_ms,
            display_interval_ms: config.display_interval_ms,
            min_display_interval_ms: config.min_display_interval_ms,
            slot_max_age_ms: config.slot_max_age_ms,
            summary_max_age_ms: config.summary_max_age_ms,
            pms_device: config.pms_device,
            co2_device: config.co2_device,
            i2c_bus: config.i2c_bus,
            sht_addr: config.sht_addr,
            oled_addr: config.oled_addr,
            telemetry_path: config.telemetry_path,
            log_level: opts
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s).ok())
                .unwrap_or_default(),
            log_file: opts.log_file,
            demo: opts.demo,
        }
    }

    pub fn sampler_intervals(&self) -> SamplerIntervals {
        SamplerIntervals {
            pm_ms: self.pm_interval_ms,
            co2_ms: self.co2_interval_ms,
            gas_ms: self.gas_interval_ms,
            climate_ms: self.climate_interval_ms,
        }
    }

    pub fn node_settings(&self) -> NodeSettings {
        NodeSettings {
            slot_max_age_ms: self.slot_max_age_ms,
            summary_max_age_ms: self.summary_max_age_ms,
            min_display_interval_ms: self.min_display_interval_ms,
            unit: TemperatureUnit::from_fahrenheit_flag(self.fahrenheit),
        }
    }
}
