#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::{env, fs};
use lazy_static::lazy_static;
use structopt::StructOpt;

// Server utilities
use crate::utils::errors::Errors;
use crate::utils::hello_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// File locations.  The same directory holds the optional runtime
// configuration file and the optional log4rs configuration file.
const ENV_CONFIG_FILE      : &str = "HELLO_SERVER_CONFIG";
const DEFAULT_CONFIG_FILE  : &str = "~/.hello_server/hello_server.toml";
const LOG4RS_CONFIG_FILE   : &str = "~/.hello_server/log4rs.yml";

// Networking.  The well-known port 80 of the original deployment requires
// elevated privileges, so the default binds an unprivileged port instead.
const DEFAULT_HTTP_ADDR    : &str = "0.0.0.0";
const DEFAULT_HTTP_PORT    : u16  = 3000;

// Console log line format used when no log4rs file is installed.
const CONSOLE_LOG_PATTERN  : &str = "{d} {l} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref HELLO_ARGS: HelloArgs = init_hello_args();
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// CommandLineArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "hello_args", about = "Command line arguments for the hello server.")]
pub struct HelloArgs {
    /// Specify the server's runtime configuration file.
    ///
    /// The configuration file path is calculated using the following
    /// priority order:
    ///
    ///   1. If set, the value of the HELLO_SERVER_CONFIG environment variable,
    ///
    ///   2. Otherwise, if set, the value of the --config-file command line argument,
    ///
    ///   3. Otherwise, ~/.hello_server/hello_server.toml
    ///
    #[structopt(short, long)]
    pub config_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub hello_args: &'static HelloArgs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Hello Server".to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

// ***************************************************************************
//                             Argument Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_hello_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_hello_args() -> HelloArgs {
    let args = HelloArgs::from_args();
    println!("{:?}", args);
    args
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
pub fn init_log() {
    // Initialize log4rs logging from the external file when one is installed.
    let logconfig = get_absolute_path(LOG4RS_CONFIG_FILE);
    if log4rs::init_file(&logconfig, Default::default()).is_ok() {
        info!("Log4rs initialized using: {}", logconfig);
        return;
    }

    // No usable log4rs file, fall back to console logging at the info level.
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .build();
    let config = match log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info)) {
            Ok(c) => c,
            Err(e) => {
                println!("{}", e);
                panic!("{}", Errors::Log4rsInitialization(logconfig));
            },
        };
    match log4rs::init_config(config) {
        Ok(_) => (),
        Err(e) => {
            println!("{}", e);
            panic!("{}", Errors::Log4rsInitialization(logconfig));
        },
    }
    info!("Log4rs initialized using the built-in console configuration.");
}

/// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file specified
 * either through an environment variable or as a command line argument.  If
 * neither is provided, an attempt is made to use the default file path.
 */
fn get_parms() -> Result<Parms> {
    // Get the config file path using the documented precedence rules.
    let config_file = env::var(ENV_CONFIG_FILE).unwrap_or_else(
        |_| {
            match HELLO_ARGS.config_file.clone() {
                Some(f) => f,
                None => DEFAULT_CONFIG_FILE.to_string(),
            }
        });

    // Read the configuration file.
    let config_file_abs = get_absolute_path(&config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            println!("Unable to read configuration at {}. Using default values.", config_file_abs);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    // Parse the toml configuration.
    let config : Config = match toml::from_str(&contents) {
        Ok(c)  => c,
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file_abs), e);
            error!("{}", msg);
            return Result::Err(anyhow!(msg));
        }
    };

    Ok(Parms { config_file: config_file_abs, config })
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // If this fails the application aborts.
    let parms = get_parms().expect("FAILED to read configuration file.");
    RuntimeCtx { parms, hello_args: &HELLO_ARGS }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::utils::config::Config;

    #[test]
    fn default_config() {
        let config = Config::new();
        assert_eq!(config.http_addr, super::DEFAULT_HTTP_ADDR);
        assert_eq!(config.http_port, super::DEFAULT_HTTP_PORT);
    }

    #[test]
    fn parse_config() {
        let contents = r#"
            title = "Hello Server"
            http_addr = "127.0.0.1"
            http_port = 8080
        "#;
        let config: Config = toml::from_str(contents).expect("TOML parse failed");
        assert_eq!(config.http_addr, "127.0.0.1");
        assert_eq!(config.http_port, 8080);
    }
}
