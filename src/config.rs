use chrono::Duration;
use std::env;
use std::str::FromStr;

/// Runtime mode, mirroring the usual development/production/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
    Test,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(RunMode::Development),
            "production" => Ok(RunMode::Production),
            "test" => Ok(RunMode::Test),
            other => Err(format!(
                "Invalid RUN_MODE '{}'. Expected development, production or test",
                other
            )),
        }
    }
}

/// Process configuration, built once at startup and shared via `web::Data`.
/// Required variables fail fast with a clear message instead of surfacing
/// later as request errors.
#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let run_mode = env::var("RUN_MODE")
            .unwrap_or_else(|_| "development".to_string())
            .parse::<RunMode>()?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| "PORT must be a valid port number".to_string())?;

        let mongodb_uri =
            env::var("MONGODB_URI").map_err(|_| "MONGODB_URI must be set".to_string())?;

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let jwt_expires_in = parse_duration(
            &env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "7d".to_string()),
        )?;

        Ok(Config {
            run_mode,
            host,
            port,
            mongodb_uri,
            jwt_secret,
            jwt_expires_in,
        })
    }
}

/// Parses duration strings like `7d`, `24h`, `30m`, `45s` or plain seconds.
fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("JWT_EXPIRES_IN must not be empty".to_string());
    }

    let (number, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        _ => (value, None),
    };

    let amount: i64 = number
        .parse()
        .map_err(|_| format!("Invalid duration '{}'", value))?;
    if amount <= 0 {
        return Err(format!("Invalid duration '{}'", value));
    }

    match unit {
        Some('d') => Ok(Duration::days(amount)),
        Some('h') => Ok(Duration::hours(amount)),
        Some('m') => Ok(Duration::minutes(amount)),
        Some('s') | None => Ok(Duration::seconds(amount)),
        Some(other) => Err(format!("Unknown duration unit '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_units() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("3600").unwrap(), Duration::seconds(3600));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-5d").is_err());
        assert!(parse_duration("10y").is_err());
    }

    #[test]
    fn run_mode_parses() {
        assert_eq!("production".parse::<RunMode>().unwrap(), RunMode::Production);
        assert!("staging".parse::<RunMode>().is_err());
    }
}
