use crate::error::{DuoError, DuoResult};

pub const DEFAULT_TCP_PORT: u16 = 12345;
pub const DEFAULT_UDP_PORT: u16 = 54321;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub tcp_port: u16,
    pub udp_port: u16,
    /// Size of the UDP receive buffer; longer requests are truncated by the OS.
    pub max_datagram_size: usize,
    /// Upper bound on concurrent TCP sessions, 0 for no limit.
    pub max_connections: usize,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            tcp_port: DEFAULT_TCP_PORT,
            udp_port: DEFAULT_UDP_PORT,
            max_datagram_size: 1024,
            max_connections: 0,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Build a config from defaults, the process environment and `args`, in
    /// increasing order of precedence.
    pub fn load(args: &[String]) -> DuoResult<Self> {
        let mut config = Config::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        config.apply_args(args)?;
        Ok(config)
    }

    pub fn from_args(args: &[String]) -> DuoResult<Self> {
        let mut config = Config::default();
        config.apply_args(args)?;
        Ok(config)
    }

    /// Override fields from `DUOKV_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> DuoResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DUOKV_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("DUOKV_TCP_PORT") {
            self.tcp_port = parse_value("DUOKV_TCP_PORT", &v)?;
        }
        if let Some(v) = lookup("DUOKV_UDP_PORT") {
            self.udp_port = parse_value("DUOKV_UDP_PORT", &v)?;
        }
        if let Some(v) = lookup("DUOKV_MAX_DATAGRAM_SIZE") {
            self.max_datagram_size = parse_value("DUOKV_MAX_DATAGRAM_SIZE", &v)?;
        }
        if let Some(v) = lookup("DUOKV_MAX_CONNECTIONS") {
            self.max_connections = parse_value("DUOKV_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DUOKV_LOGLEVEL") {
            self.loglevel = v;
        }
        Ok(())
    }

    /// Override fields from command line flags. A leading `server` mode word
    /// is accepted and skipped.
    pub fn apply_args(&mut self, args: &[String]) -> DuoResult<()> {
        let mut i = 0;
        if let Some(mode) = args.first() {
            if !mode.starts_with("--") {
                if !mode.eq_ignore_ascii_case("server") {
                    return Err(DuoError::UnknownMode(mode.clone()));
                }
                i = 1;
            }
        }

        while i < args.len() {
            let flag = args[i].as_str();
            let value = args
                .get(i + 1)
                .ok_or_else(|| DuoError::Config(format!("missing value for {flag}")))?;
            match flag {
                "--bind" => self.bind = value.clone(),
                "--tcp-port" => self.tcp_port = parse_value(flag, value)?,
                "--udp-port" => self.udp_port = parse_value(flag, value)?,
                "--max-datagram-size" => self.max_datagram_size = parse_value(flag, value)?,
                "--max-connections" => self.max_connections = parse_value(flag, value)?,
                "--loglevel" => self.loglevel = value.clone(),
                _ => return Err(DuoError::Config(format!("unknown option {flag}"))),
            }
            i += 2;
        }

        if self.max_datagram_size == 0 {
            return Err(DuoError::Config(
                "max-datagram-size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tcp_addr(&self) -> String {
        format!("{}:{}", self.bind, self.tcp_port)
    }

    pub fn udp_addr(&self) -> String {
        format!("{}:{}", self.bind, self.udp_port)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> DuoResult<T> {
    value
        .parse()
        .map_err(|_| DuoError::Config(format!("invalid value '{value}' for {name}")))
}
