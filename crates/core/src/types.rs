/// All database primary keys are UUIDs. Ids travel inside signed token
/// claims, so they must be opaque and unguessable.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
