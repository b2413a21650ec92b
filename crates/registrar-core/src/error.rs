//! Error types shared by the store, its backends, and application handlers.

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend could not be reached or failed mid-operation.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The projection moved on between read and conditional write.
    #[error(
        "concurrent modification on stream {stream_id}: expected version {expected}, found {actual}"
    )]
    ConcurrentModification {
        /// The stream that had the conflict.
        stream_id: Uuid,
        /// The version the writer read.
        expected: i64,
        /// The version found at write time.
        actual: i64,
    },

    /// A stored record could not be encoded or decoded.
    #[error("malformed record in stream {stream_id}: {reason}")]
    MalformedRecord {
        /// The stream the record belongs to.
        stream_id: Uuid,
        /// What went wrong.
        reason: String,
    },

    /// Strict replay met an event type this build does not know.
    #[error("unknown event type `{event_type}` in stream {stream_id}")]
    UnknownEventType {
        /// The stream the record belongs to.
        stream_id: Uuid,
        /// The unrecognised type tag.
        event_type: String,
    },

    /// A creation event was appended to a stream that already exists.
    #[error("stream {0} already has a creation event")]
    DuplicateCreation(Uuid),

    /// An aggregate required by a command does not exist.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// A command failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// Whether repeating the operation may succeed without any other change.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::ConcurrentModification { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_and_conflict_errors_are_retryable() {
        let stream_id = Uuid::new_v4();

        assert!(StoreError::BackendUnavailable("timeout".into()).is_retryable());
        assert!(
            StoreError::ConcurrentModification {
                stream_id,
                expected: 1,
                actual: 2,
            }
            .is_retryable()
        );
        assert!(
            !StoreError::MalformedRecord {
                stream_id,
                reason: "bad json".into(),
            }
            .is_retryable()
        );
        assert!(!StoreError::DuplicateCreation(stream_id).is_retryable());
    }

    #[test]
    fn test_concurrent_modification_message_names_versions() {
        let stream_id = Uuid::nil();
        let message = StoreError::ConcurrentModification {
            stream_id,
            expected: 3,
            actual: 4,
        }
        .to_string();

        assert_eq!(
            message,
            "concurrent modification on stream 00000000-0000-0000-0000-000000000000: expected version 3, found 4"
        );
    }
}
