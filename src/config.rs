use std::env;
use std::time::Duration;

use crate::engine::pricing::Tariff;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub seed_file: Option<String>,
    pub engine: EngineSettings,
}

/// Knobs the engine reads at request time.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub tariff: Tariff,
    pub dispatch_radius_km: f64,
    pub store_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tariff: Tariff::default(),
            dispatch_radius_km: 8.0,
            store_timeout: Duration::from_millis(2_000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = EngineSettings::default();
        let tariff = Tariff {
            base_fee: parse_or_default("BASE_DELIVERY_FEE", defaults.tariff.base_fee)?,
            free_radius_km: parse_or_default(
                "FREE_DELIVERY_RADIUS_KM",
                defaults.tariff.free_radius_km,
            )?,
            per_km_fee: parse_or_default("PER_KM_FEE", defaults.tariff.per_km_fee)?,
        };

        let dispatch_radius_km = parse_or_default("DISPATCH_RADIUS_KM", defaults.dispatch_radius_km)?;
        if dispatch_radius_km.is_nan() || dispatch_radius_km <= 0.0 {
            return Err(AppError::Internal(
                "DISPATCH_RADIUS_KM must be > 0".to_string(),
            ));
        }

        let store_timeout_ms: u64 = parse_or_default("STORE_TIMEOUT_MS", 2_000)?;
        if store_timeout_ms == 0 {
            return Err(AppError::Internal("STORE_TIMEOUT_MS must be > 0".to_string()));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: parse_log_format(env::var("LOG_FORMAT").ok().as_deref())?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            seed_file: env::var("SEED_FILE").ok().filter(|path| !path.trim().is_empty()),
            engine: EngineSettings {
                tariff,
                dispatch_radius_km,
                store_timeout: Duration::from_millis(store_timeout_ms),
            },
        })
    }
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("compact") => Ok(LogFormat::Compact),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other}, expected compact/json"
        ))),
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::{LogFormat, parse_log_format, parse_or_default};

    #[test]
    fn unset_variable_falls_back_to_default() {
        let value: u16 = parse_or_default("DELIVERY_ENGINE_TEST_UNSET_PORT", 4242).unwrap();
        assert_eq!(value, 4242);
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(parse_log_format(None).unwrap(), LogFormat::Compact);
        assert_eq!(parse_log_format(Some("json")).unwrap(), LogFormat::Json);
        assert!(parse_log_format(Some("xml")).is_err());
    }
}
