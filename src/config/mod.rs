use crate::error::ConfigError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub admin_emails: Vec<String>,
    pub send_timeout: Duration,
    pub fcm: Option<FcmSettings>,
}

#[derive(Debug, Clone)]
pub struct FcmSettings {
    pub project_id: String,
    pub credential: FcmCredential,
    pub endpoint: Option<String>,
}

/// Where the FCM OAuth access token comes from. Tokens expire after about an
/// hour, so long-running deployments should point at a file that an external
/// refresher rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcmCredential {
    Static(String),
    /// Re-read before every send.
    File(PathBuf),
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let send_timeout = match get("SEND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: "SEND_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "SEND_TIMEOUT_SECS",
                        value: raw,
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        };

        let admin_emails = get("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let credential = match (get("FCM_ACCESS_TOKEN_FILE"), get("FCM_ACCESS_TOKEN")) {
            (Some(path), _) => Some(FcmCredential::File(PathBuf::from(path))),
            (None, Some(token)) => Some(FcmCredential::Static(token)),
            (None, None) => None,
        };
        let fcm = match (get("FCM_PROJECT_ID"), credential) {
            (Some(project_id), Some(credential)) => Some(FcmSettings {
                project_id,
                credential,
                endpoint: get("FCM_ENDPOINT"),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            admin_emails,
            send_timeout,
            fcm,
        })
    }
}

/// Identities allowed to use the admin endpoints.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: HashSet<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admins: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(&identity.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}
