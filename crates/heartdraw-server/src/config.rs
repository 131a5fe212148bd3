use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Secrets that must never sign real sessions.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_days: i64,
    pub static_dir: Option<PathBuf>,
    pub seed: bool,
    pub dev: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let flag = |key: &str| matches!(get(key).as_deref(), Some("1" | "true" | "yes"));
        let dev = flag("HEARTDRAW_DEV");

        let host = get("HEARTDRAW_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("HEARTDRAW_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("HEARTDRAW_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("HEARTDRAW_HOST must be an IP address")?;

        let session_secret = match get("HEARTDRAW_SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if !PLACEHOLDER_SECRETS.contains(&secret.as_str()) => secret,
            Some(secret) if dev => secret,
            None if dev => DEV_SECRET.to_string(),
            _ => bail!(
                "HEARTDRAW_SESSION_SECRET is unset or still a placeholder; \
                 set it in your .env file or run with HEARTDRAW_DEV=1"
            ),
        };

        let session_days: i64 = match get("HEARTDRAW_SESSION_DAYS") {
            Some(v) => v.parse().context("HEARTDRAW_SESSION_DAYS must be a whole number")?,
            None => 7,
        };

        Ok(Self {
            addr,
            db_path: get("HEARTDRAW_DB_PATH")
                .unwrap_or_else(|| "heartdraw.db".into())
                .into(),
            session_secret,
            session_days,
            static_dir: get("HEARTDRAW_STATIC_DIR").map(PathBuf::from),
            seed: flag("HEARTDRAW_SEED"),
            dev,
        })
    }
}
