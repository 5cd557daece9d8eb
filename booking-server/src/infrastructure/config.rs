use chrono::FixedOffset;

use crate::application::civil_time::{DEFAULT_UTC_OFFSET_SECS, parse_utc_offset};
use crate::domain::reservation::ReservationStatus;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_origins: Vec<String>,
    pub civil_offset: FixedOffset,
    pub initial_status: ReservationStatus,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let host = var("HOST", "127.0.0.1");
        let port = var("PORT", "8080")
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let jwt_ttl_hours: i64 = var("JWT_TTL_HOURS", "24")
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid JWT_TTL_HOURS: {}", e))?;
        if jwt_ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }
        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let civil_offset = match lookup("CIVIL_UTC_OFFSET") {
            Some(value) => parse_utc_offset(value.trim())
                .map_err(|e| anyhow::anyhow!("invalid CIVIL_UTC_OFFSET: {}", e))?,
            None => FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS)
                .ok_or_else(|| anyhow::anyhow!("invalid default civil offset"))?,
        };
        let initial_status = match var("BOOKING_INITIAL_STATUS", "confirmed").trim() {
            "confirmed" => ReservationStatus::Confirmed,
            "pending" => ReservationStatus::Pending,
            other => anyhow::bail!(
                "BOOKING_INITIAL_STATUS must be `confirmed` or `pending`, got {other:?}"
            ),
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            cors_origins,
            civil_offset,
            initial_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/booking"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.civil_offset.local_minus_utc(), 19_800);
        assert_eq!(config.initial_status, ReservationStatus::Confirmed);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "9000"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("CIVIL_UTC_OFFSET", "-03:00"),
            ("BOOKING_INITIAL_STATUS", "pending"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.civil_offset.local_minus_utc(), -3 * 3600);
        assert_eq!(config.initial_status, ReservationStatus::Pending);
    }

    #[test]
    fn missing_or_bad_values_fail() {
        assert!(load(&REQUIRED[..1]).is_err());
        for bad in [
            ("PORT", "eighty"),
            ("JWT_TTL_HOURS", "0"),
            ("CIVIL_UTC_OFFSET", "IST"),
            ("BOOKING_INITIAL_STATUS", "cancelled"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(bad);
            assert!(load(&pairs).is_err(), "{bad:?} should be rejected");
        }
    }
}
