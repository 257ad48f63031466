use crate::store::StoreError;

/// Domain-level error shared by every catalog component.
///
/// Store failures are never swallowed: they surface as
/// [`CoreError::StoreUnavailable`] and the caller keeps its last-known-good
/// in-memory state.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A multi-step operation failed after an earlier step was applied.
    #[error("{completed} succeeded but {failed} failed: {source}")]
    PartialFailure {
        completed: &'static str,
        failed: &'static str,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display_names_both_steps() {
        let err = CoreError::PartialFailure {
            completed: "link rename",
            failed: "category order update",
            source: Box::new(CoreError::StoreUnavailable(StoreError::Unavailable(
                "connection reset".into(),
            ))),
        };
        assert_eq!(
            err.to_string(),
            "link rename succeeded but category order update failed: \
             Record store unavailable: connection failed: connection reset"
        );
    }

    #[test]
    fn store_error_converts_to_unavailable() {
        let err: CoreError = StoreError::Backend("boom".into()).into();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
    }
}
