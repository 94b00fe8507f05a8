pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_VERIFIER_URL: &str = "http://127.0.0.1:8000/result";

/// Upper bound on a single verifier round trip. Comfortably above the
/// double's maximum processing delay.
pub const DEFAULT_VERIFIER_TIMEOUT_SECS: u64 = 65;

pub const DEFAULT_RESULT_MIN_DELAY_SECS: u64 = 1;
pub const DEFAULT_RESULT_MAX_DELAY_SECS: u64 = 60;

// --- Pagination ---

pub const DEFAULT_PAGE_SKIP: u64 = 0;
pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE_LIMIT: u64 = 1000;

// --- User-facing messages ---

pub const NEGATIVE_VERDICT_MESSAGE: &str = "External server returned false. Record not created.";
pub const NO_RECORDS_MESSAGE: &str = "No records found.";
pub const MALFORMED_VERDICT_MESSAGE: &str = "External server returned an invalid response.";

pub const DEFAULT_LOG_FILTER: &str = "cadaster=info";
