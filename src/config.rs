use crate::consts::*;
use crate::exceptions::CadasterError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, read once at startup and passed into the
/// store and verifier constructors.
#[derive(clap::Args, Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server listens on.
    #[arg(long, env = "CADASTER_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// SQLite database: a path, `:memory:` or a `sqlite://` URL.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Endpoint consulted once per query for a verdict.
    #[arg(long, env = "VERIFIER_URL", default_value = DEFAULT_VERIFIER_URL)]
    pub verifier_url: String,

    #[arg(long, env = "VERIFIER_TIMEOUT_SECS", default_value_t = DEFAULT_VERIFIER_TIMEOUT_SECS)]
    pub verifier_timeout_secs: u64,

    /// Lower bound of the simulated processing delay of `GET /result`.
    #[arg(long, env = "RESULT_MIN_DELAY_SECS", default_value_t = DEFAULT_RESULT_MIN_DELAY_SECS)]
    pub result_min_delay_secs: u64,

    /// Upper bound of the simulated processing delay of `GET /result`.
    #[arg(long, env = "RESULT_MAX_DELAY_SECS", default_value_t = DEFAULT_RESULT_MAX_DELAY_SECS)]
    pub result_max_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl Settings {
    pub fn validate(&self) -> Result<(), CadasterError> {
        if self.verifier_timeout_secs == 0 {
            return Err(CadasterError::Configuration(
                "verifier timeout must be at least one second.".to_string(),
            ));
        }
        if self.result_min_delay_secs > self.result_max_delay_secs {
            return Err(CadasterError::Configuration(format!(
                "result delay range is empty ({}..={}).",
                self.result_min_delay_secs, self.result_max_delay_secs
            )));
        }
        let url = reqwest::Url::parse(&self.verifier_url).map_err(|e| {
            CadasterError::Configuration(format!(
                "Invalid verifier URL '{}': {}",
                self.verifier_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CadasterError::Configuration(format!(
                "Verifier URL '{}' must use http or https.",
                self.verifier_url
            )));
        }
        self.database_location()?;
        Ok(())
    }

    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_secs(self.verifier_timeout_secs)
    }

    pub fn database_location(&self) -> Result<DatabaseLocation, CadasterError> {
        parse_database_url(&self.database_url)
    }
}

/// Accepts `:memory:`, a bare path, `sqlite[+driver]://[/]path` or `sqlite:path`.
pub fn parse_database_url(raw: &str) -> Result<DatabaseLocation, CadasterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CadasterError::Configuration(
            "DATABASE_URL is required.".to_string(),
        ));
    }

    let path = match raw.split_once("://") {
        Some((scheme, rest)) => {
            if !is_sqlite_scheme(scheme) {
                return Err(CadasterError::Configuration(format!(
                    "Unsupported database scheme '{}'. Use 'sqlite://'.",
                    scheme
                )));
            }
            // sqlite:///relative.db and sqlite:////abs/path.db
            rest.strip_prefix('/').unwrap_or(rest)
        }
        // sqlite:relative.db
        None => match raw.split_once(':') {
            Some((scheme, rest)) if is_sqlite_scheme(scheme) => rest,
            _ => raw,
        },
    };

    match path {
        "" | ":memory:" => Ok(DatabaseLocation::Memory),
        p => Ok(DatabaseLocation::File(PathBuf::from(p))),
    }
}

fn is_sqlite_scheme(scheme: &str) -> bool {
    scheme.split('+').next() == Some("sqlite")
}
