/// Store-assigned primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Link ids are client-generated creation timestamps in milliseconds.
pub type LinkId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
