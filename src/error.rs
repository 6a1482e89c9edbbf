use thiserror::Error;

/// Rejected or failed session transitions.
/// None of these are fatal: the caller logs them and keeps running.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session is active (stop requested for test {requested})")]
    NotActive { requested: i64 },

    #[error("stop requested for test {requested} but test {active} is running")]
    TestIdMismatch { active: i64, requested: i64 },

    #[error("failed to activate listener '{listener}': {source}")]
    Activation {
        listener: &'static str,
        #[source]
        source: SubscriptionError,
    },
}

/// Listener lifecycle failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("listener '{0}' needs a tokio runtime to activate")]
    NoRuntime(&'static str),

    #[error("listener '{0}' is already active")]
    AlreadyActive(&'static str),

    #[error("listener '{0}' exited before it was deactivated")]
    ListenerExited(&'static str),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector answered with status {0}")]
    Status(u16),

    #[error("could not encode session record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("upload task did not complete: {0}")]
    Join(String),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} is not available on this device")]
    Unavailable(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse {what}: '{raw}'")]
    Parse { what: &'static str, raw: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
