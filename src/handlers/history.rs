use crate::consts::{DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_SKIP, MAX_PAGE_LIMIT, NO_RECORDS_MESSAGE};
use crate::exceptions::CadasterError;
use crate::historystore::HistoryStore;
use crate::models::HistoryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: DEFAULT_PAGE_SKIP,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Result<Self, CadasterError> {
        let page = Self {
            skip: skip.unwrap_or(DEFAULT_PAGE_SKIP),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        };
        if page.limit == 0 || page.limit > MAX_PAGE_LIMIT {
            return Err(CadasterError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(page)
    }

    /// Parses raw query-string values. Empty values fall back to defaults.
    pub fn parse(skip: Option<&str>, limit: Option<&str>) -> Result<Self, CadasterError> {
        Self::new(parse_count("skip", skip)?, parse_count("limit", limit)?)
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u64>, CadasterError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            CadasterError::Validation(format!("{} must be a non-negative integer", name))
        }),
    }
}

/// Lists history, filtered by cadastral number when given. An empty
/// result is reported as `NotFound` rather than as an empty list.
pub fn read(
    store: &HistoryStore,
    cadastral_number: Option<&str>,
    page: Page,
) -> Result<Vec<HistoryRecord>, CadasterError> {
    // An empty filter means "no filter".
    let filter = cadastral_number.filter(|n| !n.is_empty());
    let records = store.list(filter, page.skip, page.limit)?;
    if records.is_empty() {
        return Err(CadasterError::NotFound(NO_RECORDS_MESSAGE.to_string()));
    }
    Ok(records)
}

/// Entry point for `GET /history`. Pagination values are only looked at
/// for the unfiltered listing; a filtered read ignores them entirely.
pub fn read_with_params(
    store: &HistoryStore,
    cadastral_number: Option<&str>,
    skip: Option<&str>,
    limit: Option<&str>,
) -> Result<Vec<HistoryRecord>, CadasterError> {
    match cadastral_number.filter(|n| !n.is_empty()) {
        Some(number) => read(store, Some(number), Page::default()),
        None => read(store, None, Page::parse(skip, limit)?),
    }
}

pub fn clear(store: &HistoryStore) -> Result<(), CadasterError> {
    store.delete_all()
}

pub fn delete_one(store: &HistoryStore, id: i64) -> Result<HistoryRecord, CadasterError> {
    store
        .delete_by_id(id)?
        .ok_or_else(|| CadasterError::NotFound(format!("Record with ID {} not found.", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewHistoryRecord;

    fn seeded(numbers: &[&str]) -> HistoryStore {
        let store = HistoryStore::open_in_memory().unwrap();
        for n in numbers {
            store
                .create(&NewHistoryRecord {
                    cadastral_number: n.to_string(),
                    latitude: 1.0,
                    longitude: 2.0,
                    server_response: true,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(Page::new(None, None).unwrap(), Page::default());
        assert_eq!(Page::default().limit, 100);
        assert!(Page::new(Some(5), Some(MAX_PAGE_LIMIT)).is_ok());
        assert!(Page::new(None, Some(0)).is_err());
        assert!(Page::new(None, Some(MAX_PAGE_LIMIT + 1)).is_err());
    }

    #[test]
    fn test_page_parse_raw_values() {
        assert_eq!(Page::parse(None, Some("")).unwrap(), Page::default());
        assert_eq!(
            Page::parse(Some("3"), Some("7")).unwrap(),
            Page { skip: 3, limit: 7 }
        );
        assert!(Page::parse(Some("-1"), None).is_err());
        assert!(Page::parse(None, Some("ten")).is_err());
    }

    #[test]
    fn test_read_with_params_filter_ignores_bad_pagination() {
        let store = seeded(&["A1", "A1", "B2"]);
        for (skip, limit) in [(None, Some("0")), (None, Some("5000")), (Some("-1"), Some("x"))] {
            let records = read_with_params(&store, Some("A1"), skip, limit).unwrap();
            assert_eq!(records.len(), 2);
        }
    }

    #[test]
    fn test_read_with_params_unfiltered_validates_pagination() {
        let store = seeded(&["A1", "B2", "C3"]);
        assert!(matches!(
            read_with_params(&store, None, None, Some("0")),
            Err(CadasterError::Validation(_))
        ));
        assert!(matches!(
            read_with_params(&store, Some(""), Some("-1"), None),
            Err(CadasterError::Validation(_))
        ));
        let page = read_with_params(&store, None, Some("1"), Some("1")).unwrap();
        assert_eq!(page[0].cadastral_number, "B2");
    }

    #[test]
    fn test_read_empty_store_is_not_found() {
        let store = seeded(&[]);
        let err = read(&store, None, Page::default()).unwrap_err();
        assert!(matches!(err, CadasterError::NotFound(_)));
    }

    #[test]
    fn test_read_filter_matches_exactly() {
        let store = seeded(&["A1", "A1", "B2"]);
        assert_eq!(read(&store, Some("A1"), Page::default()).unwrap().len(), 2);
        assert_eq!(read(&store, Some("B2"), Page::default()).unwrap().len(), 1);
        assert!(matches!(
            read(&store, Some("C3"), Page::default()),
            Err(CadasterError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_blank_filter_lists_everything() {
        let store = seeded(&["A1", "B2"]);
        assert_eq!(read(&store, Some(""), Page::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_one_missing_id_names_the_id() {
        let store = seeded(&["A1"]);
        let err = delete_one(&store, 42).unwrap_err();
        assert_eq!(err.to_string(), "Record with ID 42 not found.");
        assert_eq!(store.count().unwrap(), 1);
    }
}
