use crate::consts::NEGATIVE_VERDICT_MESSAGE;
use crate::exceptions::CadasterError;
use crate::historystore::HistoryStore;
use crate::models::{HistoryRecord, NegativeVerdict, NewHistoryRecord, QueryRequest};
use crate::verifier::VerifierClient;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Affirmative verdict; the record was persisted.
    Created(HistoryRecord),
    /// Negative verdict; nothing was persisted.
    NotCreated(NegativeVerdict),
}

/// Consults the verifier exactly once and persists the query only on an
/// affirmative verdict. `query` must already be validated.
pub async fn handle(
    verifier: &VerifierClient,
    store: &HistoryStore,
    query: &QueryRequest,
) -> Result<QueryOutcome, CadasterError> {
    let verdict = verifier.verify().await?;

    if !verdict {
        info!(cadastral_number = %query.cadastral_number, "negative verdict, nothing stored");
        return Ok(QueryOutcome::NotCreated(NegativeVerdict {
            message: NEGATIVE_VERDICT_MESSAGE.to_string(),
            cadastral_number: query.cadastral_number.clone(),
            server_response: false,
        }));
    }

    let record = store.create(&NewHistoryRecord::from_query(query, true))?;
    info!(id = record.id, cadastral_number = %record.cadastral_number, "query recorded");
    Ok(QueryOutcome::Created(record))
}
