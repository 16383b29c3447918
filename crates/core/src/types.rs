/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Environment mapping handed to a child process.
///
/// Ordered so that logs and test assertions are deterministic.
pub type EnvMap = std::collections::BTreeMap<String, String>;
