use crate::{Error, Result};

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub config_path: Option<String>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub device_id: Option<String>,
    pub demo: bool,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Box<RunOptions>),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Command::Run(Box::default()));
        }

        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            Some("run") => Ok(Command::Run(Box::new(parse_run_options(&mut iter)?))),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // `run` is implied when the first argument is already a flag.
                let mut flags: Vec<String> = Vec::with_capacity(args.len());
                flags.push(flag.to_string());
                flags.extend(iter.map(|s| s.to_string()));
                let mut iter = flags.iter();
                Ok(Command::Run(Box::new(parse_run_options(&mut iter)?)))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
            None => Ok(Command::Run(Box::default())),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "airnode - air-quality sensor node daemon\n",
            "\n",
            "USAGE:\n",
            "  airnode run [--config <path>] [--bind <addr>] [--port <number>] [--device-id <id>] [--demo]\n",
            "              [--log-level <level>] [--log-file <path>]\n",
            "  airnode --help\n",
            "  airnode --version\n",
            "\n",
            "OPTIONS:\n",
            "  --config <path>     Config file (default: ~/.airnode/config.toml)\n",
            "  --bind <addr>       HTTP bind address (default: 0.0.0.0)\n",
            "  --port <number>     HTTP port (default: 9926)\n",
            "  --device-id <id>    Identity label reported on /metrics\n",
            "  --demo              Use simulated sensors instead of hardware drivers\n",
            "  --log-level <level> error|warn|info|debug|trace (default: info)\n",
            "  --log-file <path>   Append log lines to this file as well as stderr\n",
            "  -h, --help          Show this help\n",
            "  -V, --version       Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => {
                opts.config_path = Some(take_value(flag, iter)?);
            }
            "--bind" => {
                opts.bind = Some(take_value(flag, iter)?);
            }
            "--port" => {
                let raw = take_value(flag, iter)?;
                opts.port = Some(raw.parse().map_err(|_| {
                    Error::InvalidArgs("port must be an integer between 1 and 65535".to_string())
                })?);
            }
            "--device-id" => {
                opts.device_id = Some(take_value(flag, iter)?);
            }
            "--demo" => {
                opts.demo = true;
            }
            "--log-level" => {
                opts.log_level = Some(take_value(flag, iter)?);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}
