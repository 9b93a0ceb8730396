use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
    LockTimeout(&'static str),
    NotFound(String),
}

impl std::error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "IO error: {}", e),
            StoreError::SerdeError(e) => write!(f, "Serialization error: {}", e),
            StoreError::LockTimeout(what) => write!(f, "Timeout while acquiring {} lock", what),
            StoreError::NotFound(id) => write!(f, "Record not found: {}", id),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerdeError(err)
    }
}

#[derive(Debug)]
pub enum DispatchError {
    MissingSmtpConfig,
    InvalidSmtpConfig(String),
    InvalidAddress(String),
    Message(String),
    Transport(String),
    Timeout(std::time::Duration),
    Store(StoreError),
}

impl std::error::Error for DispatchError {}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::MissingSmtpConfig => write!(f, "SMTP configuration not found"),
            DispatchError::InvalidSmtpConfig(e) => write!(f, "Invalid SMTP configuration: {}", e),
            DispatchError::InvalidAddress(e) => write!(f, "Invalid email address: {}", e),
            DispatchError::Message(e) => write!(f, "Failed to build email: {}", e),
            DispatchError::Transport(e) => write!(f, "Email transport error: {}", e),
            DispatchError::Timeout(d) => write!(f, "Email send timed out after {}s", d.as_secs()),
            DispatchError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        DispatchError::Store(err)
    }
}

impl From<lettre::address::AddressError> for DispatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        DispatchError::InvalidAddress(err.to_string())
    }
}

impl From<lettre::error::Error> for DispatchError {
    fn from(err: lettre::error::Error) -> Self {
        DispatchError::Message(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for DispatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        DispatchError::Transport(err.to_string())
    }
}

#[derive(Debug)]
pub enum PushError {
    Http(reqwest::Error),
    Credential(std::io::Error),
    /// FCM refused the access token, usually because it expired.
    Unauthorized { status: u16 },
    Rejected { status: u16, body: String },
}

impl std::error::Error for PushError {}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Http(e) => write!(f, "Push request failed: {}", e),
            PushError::Credential(e) => write!(f, "Could not read FCM access token: {}", e),
            PushError::Unauthorized { status } => write!(
                f,
                "FCM rejected the access token with status {}; it may have expired",
                status
            ),
            PushError::Rejected { status, body } => {
                write!(f, "Push rejected with status {}: {}", status, body)
            }
        }
    }
}

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        PushError::Http(err)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

#[derive(Debug)]
pub enum PrayerError {
    Invalid(String),
    Store(StoreError),
}

impl std::error::Error for PrayerError {}

impl fmt::Display for PrayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrayerError::Invalid(e) => write!(f, "Invalid prayer: {}", e),
            PrayerError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl From<StoreError> for PrayerError {
    fn from(err: StoreError) -> Self {
        PrayerError::Store(err)
    }
}
