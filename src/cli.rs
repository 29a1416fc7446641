use std::path::PathBuf;

use regex::Regex;

/// Default address for both the client and the server
///
/// Can be overridden with the BASKET_ADDRESS environment variable or on the command line.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

/// Default directory of the order records, relative to the working directory
pub const DEFAULT_ORDERS_DIR: &str = "orders";

/// Environment variables read by the binaries
pub mod env_vars {
    /// Address the server listens on / the client connects to
    pub const ADDRESS: &str = "BASKET_ADDRESS";
    /// Directory holding the order records
    pub const ORDERS_DIR: &str = "BASKET_ORDERS_DIR";
    /// SQLite file keeping the sessions, sessions are kept in memory if unset
    pub const SESSION_DB: &str = "BASKET_SESSION_DB";
    /// Number of worker threads of the server
    pub const WORKERS: &str = "BASKET_WORKERS";
    /// Session id the client sends its requests with
    pub const SESSION: &str = "BASKET_SESSION";
}

/// Errors that can occur when parsing the command line arguments
#[derive(Debug, Clone)]
pub enum CLIError {
    InvalidUrlFormat,
    MissingParameter(&'static str),
    InvalidParameter,
}

impl std::fmt::Display for CLIError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CLIError::InvalidUrlFormat => {
                write!(f, "Invalid target format. Should be <host>:<port>")
            }
            CLIError::MissingParameter(missing) => write!(f, "Missing parameter '{}'", missing),
            CLIError::InvalidParameter => write!(f, "Invalid parameter"),
        }
    }
}

impl std::error::Error for CLIError {}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise InvalidUrlFormat
pub fn validate_address(url: &str) -> std::result::Result<&str, CLIError> {
    let re = Regex::new(r"^[a-zA-Z0-9\.\-]+:\d{1,5}$").map_err(|_| CLIError::InvalidUrlFormat)?;
    if re.is_match(url) {
        Ok(url)
    } else {
        Err(CLIError::InvalidUrlFormat)
    }
}

/// Settings of the server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub address: String,
    pub orders_dir: PathBuf,
    pub session_db: Option<PathBuf>,
    pub workers: usize,
}

impl ServerConfig {
    /// Build the configuration from the command line (`server [address]`) and the environment
    ///
    /// The command line wins over the environment, which wins over the defaults. `env` looks up
    /// a variable, it is `std::env::var` outside of tests.
    pub fn from_args<I, F>(mut args: I, env: F, default_workers: usize) -> Result<Self, CLIError>
    where
        I: Iterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        args.next(); // Skip the program name

        let address = args
            .next()
            .or_else(|| env(env_vars::ADDRESS))
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        validate_address(&address)?;

        let workers = match env(env_vars::WORKERS) {
            Some(workers) => workers
                .parse::<usize>()
                .ok()
                .filter(|workers| *workers > 0)
                .ok_or(CLIError::InvalidParameter)?,
            None => default_workers,
        };

        Ok(ServerConfig {
            address,
            orders_dir: env(env_vars::ORDERS_DIR)
                .filter(|dir| !dir.is_empty())
                .unwrap_or_else(|| DEFAULT_ORDERS_DIR.to_string())
                .into(),
            session_db: env(env_vars::SESSION_DB)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            workers,
        })
    }
}
