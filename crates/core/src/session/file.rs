use super::SessionStore;
use crate::types::{Session, User};
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";

/// On-disk layout, one entry per key the browser client used
#[derive(Serialize, Deserialize, Default)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_user: Option<serde_json::Value>,
}

/// Session store persisted as JSON under the data directory.
///
/// Unreadable contents are treated as "signed out" rather than an error,
/// so a damaged file never locks the user out of logging in again.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at `<data_dir>/session.json`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, raw: &str) -> Option<Session> {
        let stored: StoredSession = match serde_json::from_str(raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable session file: {e}");
                return None;
            }
        };

        let token = stored.auth_token.filter(|token| !token.is_empty())?;
        let user: User = match stored.auth_user.map(serde_json::from_value) {
            Some(Ok(user)) => user,
            Some(Err(e)) => {
                warn!(path = %self.path.display(), "Ignoring unreadable stored user: {e}");
                return None;
            }
            None => return None,
        };

        Some(Session::new(token, user))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> CoreResult<Option<Session>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(self.decode(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &Session) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::storage_error(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let stored = StoredSession {
            auth_token: Some(session.access_token.clone()),
            auth_user: Some(serde_json::to_value(&session.user)?),
        };
        let content = serde_json::to_string_pretty(&stored)?;

        // Readers never observe a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Saved session");
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
