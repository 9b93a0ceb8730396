use serde::{Deserialize, Serialize};

/// Admin-managed SMTP settings. Read fresh on every dispatch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl SmtpConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("SMTP host is required.".to_string());
        }
        if self.user.trim().is_empty() {
            return Err("SMTP username is required.".to_string());
        }
        if self.pass.trim().is_empty() {
            return Err("SMTP password is required.".to_string());
        }
        if self.from.trim().is_empty() {
            return Err("From email is required.".to_string());
        }
        if self.port == 0 {
            return Err("Port must be a valid number between 1 and 65535.".to_string());
        }
        Ok(())
    }

    /// Copy safe to hand back to the admin UI.
    pub fn redacted(&self) -> Self {
        Self {
            pass: String::new(),
            ..self.clone()
        }
    }
}
