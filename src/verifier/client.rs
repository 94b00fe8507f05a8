use crate::config::Settings;
use crate::consts::MALFORMED_VERDICT_MESSAGE;
use crate::exceptions::CadasterError;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Asks the upstream verifier for a verdict. One request per call, no
/// retries; exceeding the deadline counts as a transport failure.
#[derive(Debug, Clone)]
pub struct VerifierClient {
    http: HttpClient,
    url: String,
    timeout: Duration,
}

impl VerifierClient {
    pub fn new(settings: &Settings) -> Result<Self, CadasterError> {
        Self::with_endpoint(settings.verifier_url.clone(), settings.verifier_timeout())
    }

    pub fn with_endpoint(url: impl Into<String>, timeout: Duration) -> Result<Self, CadasterError> {
        let http = crate::utils::setup_http_client(timeout)
            .map_err(|e| CadasterError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn verify(&self) -> Result<bool, CadasterError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "verifier unreachable");
            self.transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "verifier returned error status");
            return Err(CadasterError::VerifierProtocol(format!(
                "{} (Status: {})",
                MALFORMED_VERDICT_MESSAGE, status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "verifier reply interrupted");
            self.transport_error(&e)
        })?;

        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            warn!(url = %self.url, error = %e, "verifier reply is not JSON");
            CadasterError::VerifierProtocol(format!("{} ({})", MALFORMED_VERDICT_MESSAGE, e))
        })?;

        let verdict = parse_verdict(&value)?;
        debug!(url = %self.url, verdict, "verifier replied");
        Ok(verdict)
    }

    fn transport_error(&self, err: &reqwest::Error) -> CadasterError {
        if err.is_timeout() {
            CadasterError::VerifierUnavailable(format!(
                "no reply within {}s: {}",
                self.timeout.as_secs_f64(),
                err
            ))
        } else {
            CadasterError::VerifierUnavailable(err.to_string())
        }
    }
}

/// Extracts the boolean `result` field; anything else is a protocol error.
pub fn parse_verdict(body: &Value) -> Result<bool, CadasterError> {
    match body.get("result") {
        Some(Value::Bool(verdict)) => Ok(*verdict),
        Some(Value::Null) | None => Err(CadasterError::VerifierProtocol(format!(
            "{} (missing 'result')",
            MALFORMED_VERDICT_MESSAGE
        ))),
        Some(other) => Err(CadasterError::VerifierProtocol(format!(
            "{} ('result' is not a boolean: {})",
            MALFORMED_VERDICT_MESSAGE, other
        ))),
    }
}
