//! File-backed user store.
//!
//! One JSON document per user under the data directory. Writes go to a
//! temp file and rename into place, so a crash mid-write leaves the old
//! record intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use bot_core::{StateUpdate, StoreError, User, UserStore};

pub struct FileStore {
    data_dir: PathBuf,
    // Serializes the read-compare-write cycle across all users.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub async fn init(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        log::info!("user records at {}", data_dir.display());
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn user_path(&self, id: i64) -> PathBuf {
        self.data_dir.join(format!("{id}.json"))
    }

    async fn read_record(&self, path: &Path, id: i64) -> Result<Option<User>, StoreError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let user = serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::CorruptRecord(format!("user {id}: {err}")))?;
        Ok(Some(user))
    }

    async fn write_record(&self, user: &User) -> Result<(), StoreError> {
        let path = self.user_path(user.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(user)
            .map_err(|err| StoreError::CorruptRecord(format!("user {}: {err}", user.id)))?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileStore {
    async fn set_user_state(&self, user: &User, update: &StateUpdate) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;

        let path = self.user_path(user.id);
        let mut current = self
            .read_record(&path, user.id)
            .await?
            .ok_or(StoreError::UserNotFound(user.id))?;

        if current.state != user.state {
            return Err(StoreError::StaleState {
                id: user.id,
                expected: user.state.tag().to_string(),
                found: current.state.tag().to_string(),
            });
        }

        current.apply(update);
        self.write_record(&current).await?;
        Ok(current)
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.read_record(&self.user_path(id), id)
            .await?
            .ok_or(StoreError::UserNotFound(id))
    }

    async fn ensure_user(&self, id: i64, username: &str) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(mut user) = self.read_record(&self.user_path(id), id).await? {
            if user.refresh_username(username) {
                self.write_record(&user).await?;
            }
            return Ok(user);
        }
        let user = User::new(id, username);
        self.write_record(&user).await?;
        Ok(user)
    }
}
