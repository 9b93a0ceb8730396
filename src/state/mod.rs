use crate::error::StoreError;
use crate::types::{PrayerRecord, ReminderPreferenceUpdate, SmtpConfig, UserReminderState};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

const USERS_FILE: &str = "users.json";
const PRAYERS_FILE: &str = "prayers.json";
const SMTP_FILE: &str = "smtp.json";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Archived,
    All,
}

impl RecordStatus {
    fn admits(self, record: &PrayerRecord) -> bool {
        match self {
            RecordStatus::Active => !record.archived,
            RecordStatus::Archived => record.archived,
            RecordStatus::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_users: usize,
    pub total_prayers: usize,
    pub active_prayers: usize,
    pub archived_prayers: usize,
}

/// Document store for users, records and the SMTP singleton.
///
/// Backed by JSON files in a data directory, or purely in memory when no
/// directory is given.
pub struct AppState {
    data_dir: Option<PathBuf>,
    pub users: Mutex<HashMap<String, UserReminderState>>,
    pub prayers: Mutex<Vec<PrayerRecord>>,
    pub smtp: Mutex<Option<SmtpConfig>>,
}

impl AppState {
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            users: Mutex::new(HashMap::new()),
            prayers: Mutex::new(Vec::new()),
            smtp: Mutex::new(None),
        }
    }

    pub async fn initialize(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;

        let users: HashMap<String, UserReminderState> =
            initialize_file(&data_dir.join(USERS_FILE)).await?;
        let prayers: Vec<PrayerRecord> = initialize_file(&data_dir.join(PRAYERS_FILE)).await?;
        let smtp: Option<SmtpConfig> = initialize_file(&data_dir.join(SMTP_FILE)).await?;

        log::info!(
            "Loaded {} users and {} prayers from {}",
            users.len(),
            prayers.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir: Some(data_dir),
            users: Mutex::new(users),
            prayers: Mutex::new(prayers),
            smtp: Mutex::new(smtp),
        })
    }

    pub async fn acquire_users_lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, UserReminderState>>, StoreError> {
        match timeout(LOCK_TIMEOUT, self.users.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                log::error!("Timeout while acquiring users lock");
                Err(StoreError::LockTimeout("users"))
            }
        }
    }

    pub async fn acquire_prayers_lock(
        &self,
    ) -> Result<MutexGuard<'_, Vec<PrayerRecord>>, StoreError> {
        match timeout(LOCK_TIMEOUT, self.prayers.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                log::error!("Timeout while acquiring prayers lock");
                Err(StoreError::LockTimeout("prayers"))
            }
        }
    }

    pub async fn acquire_smtp_lock(&self) -> Result<MutexGuard<'_, Option<SmtpConfig>>, StoreError> {
        match timeout(LOCK_TIMEOUT, self.smtp.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                log::error!("Timeout while acquiring smtp lock");
                Err(StoreError::LockTimeout("smtp"))
            }
        }
    }

    /// All users ordered by id.
    pub async fn users_snapshot(&self) -> Result<Vec<(String, UserReminderState)>, StoreError> {
        let users = self.acquire_users_lock().await?;
        let mut snapshot: Vec<_> = users
            .iter()
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(snapshot)
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<UserReminderState>, StoreError> {
        Ok(self.acquire_users_lock().await?.get(user_id).cloned())
    }

    pub async fn active_records_for(&self, user_id: &str) -> Result<Vec<PrayerRecord>, StoreError> {
        self.records_for(user_id, RecordStatus::Active, None).await
    }

    pub async fn records_for(
        &self,
        user_id: &str,
        status: RecordStatus,
        query: Option<&str>,
    ) -> Result<Vec<PrayerRecord>, StoreError> {
        let prayers = self.acquire_prayers_lock().await?;
        Ok(prayers
            .iter()
            .filter(|p| p.user_id == user_id && status.admits(p))
            .filter(|p| query.map_or(true, |q| p.matches(q)))
            .cloned()
            .collect())
    }

    /// Writes go to disk first; memory changes only once the write succeeded.
    pub async fn add_record(&self, record: PrayerRecord) -> Result<(), StoreError> {
        let mut prayers = self.acquire_prayers_lock().await?;
        let mut next = prayers.clone();
        next.push(record);
        self.persist(PRAYERS_FILE, &next).await?;
        *prayers = next;
        Ok(())
    }

    pub async fn set_archived(&self, id: &str, archived: bool) -> Result<PrayerRecord, StoreError> {
        let mut prayers = self.acquire_prayers_lock().await?;
        let index = prayers
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut next = prayers.clone();
        next[index].archived = archived;
        self.persist(PRAYERS_FILE, &next).await?;
        let updated = next[index].clone();
        *prayers = next;
        Ok(updated)
    }

    /// Merges reminder preferences into the user's state. Other fields are left alone.
    pub async fn upsert_reminder_preferences(
        &self,
        user_id: &str,
        update: ReminderPreferenceUpdate,
    ) -> Result<UserReminderState, StoreError> {
        let mut users = self.acquire_users_lock().await?;
        let mut next = users.clone();
        let state = next
            .entry(user_id.to_string())
            .or_insert_with(|| UserReminderState::new(String::new(), update.reminder_frequency));
        if let Some(email) = update.email.filter(|e| !e.trim().is_empty()) {
            state.email = email;
        }
        state.reminder_frequency = update.reminder_frequency;
        state.include_active_summary = update.include_active_summary;
        let merged = state.clone();
        self.persist(USERS_FILE, &next).await?;
        *users = next;
        Ok(merged)
    }

    pub async fn set_push_token(&self, user_id: &str, token: String) -> Result<(), StoreError> {
        let mut users = self.acquire_users_lock().await?;
        let mut next = users.clone();
        next.entry(user_id.to_string())
            .or_insert_with(|| UserReminderState::new(String::new(), Default::default()))
            .fcm_token = Some(token);
        self.persist(USERS_FILE, &next).await?;
        *users = next;
        Ok(())
    }

    /// Records a confirmed send. Not persisted until the next `save_users`.
    pub async fn mark_email_sent(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.acquire_users_lock().await?;
        match users.get_mut(user_id) {
            Some(state) => {
                state.last_email_sent = Some(at);
                Ok(())
            }
            None => Err(StoreError::NotFound(user_id.to_string())),
        }
    }

    pub async fn smtp_config(&self) -> Result<Option<SmtpConfig>, StoreError> {
        Ok(self.acquire_smtp_lock().await?.clone())
    }

    pub async fn set_smtp_config(&self, config: SmtpConfig) -> Result<(), StoreError> {
        let mut smtp = self.acquire_smtp_lock().await?;
        let next = Some(config);
        self.persist(SMTP_FILE, &next).await?;
        *smtp = next;
        Ok(())
    }

    pub async fn metrics(&self) -> Result<Metrics, StoreError> {
        let total_users = self.acquire_users_lock().await?.len();
        let prayers = self.acquire_prayers_lock().await?;
        let archived_prayers = prayers.iter().filter(|p| p.archived).count();
        Ok(Metrics {
            total_users,
            total_prayers: prayers.len(),
            active_prayers: prayers.len() - archived_prayers,
            archived_prayers,
        })
    }

    pub async fn save_users(&self) -> Result<(), StoreError> {
        let users = self.acquire_users_lock().await?;
        self.persist(USERS_FILE, &*users).await
    }

    async fn persist<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(value)?;
        write_atomic(&dir.join(file), &json).await
    }
}

async fn initialize_file<T>(path: &Path) -> Result<T, StoreError>
where
    T: Default + Serialize + DeserializeOwned,
{
    if !path.exists() {
        log::info!("Creating new {}", path.display());
        let empty = T::default();
        write_atomic(path, &serde_json::to_string_pretty(&empty)?).await?;
        Ok(empty)
    } else {
        log::info!("Loading existing {}", path.display());
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

async fn write_atomic(path: &Path, json: &str) -> Result<(), StoreError> {
    // Write to a sibling temp file, then rename over the target
    let temp_path = path.with_extension("tmp.json");
    let mut temp_file = File::create(&temp_path).await?;
    temp_file.write_all(json.as_bytes()).await?;
    temp_file.flush().await?;
    drop(temp_file);

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}
