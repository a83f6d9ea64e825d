//! Environment-driven server configuration, generalized from the teacher's
//! inline `default_host`/`default_port` functions in `src/bin/web.rs` into
//! one small, independently testable struct.

use crate::models::DEFAULT_STATION_COUNT;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub station_count: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            station_count: std::env::var("STATION_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STATION_COUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_when_unset() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("STATION_COUNT");
        let cfg = Config::from_env();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.station_count, DEFAULT_STATION_COUNT);
    }

    #[test]
    fn reads_overrides_from_env() {
        std::env::set_var("PORT", "9090");
        std::env::set_var("STATION_COUNT", "12");
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.station_count, 12);
        std::env::remove_var("PORT");
        std::env::remove_var("STATION_COUNT");
    }
}
