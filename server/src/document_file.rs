use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use system::SessionCode;
use thiserror::Error;
use tokio::fs;

const EXTENSION: &str = "doc";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document io: {0}")]
    Io(#[from] std::io::Error),
    #[error("document encoding: {0}")]
    Encoding(#[from] bincode::Error),
}

/// What is stored for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub session_code: SessionCode,
    pub content: String,
    pub last_modified_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEntry {
    pub session_code: SessionCode,
    pub last_modified: String,
}

impl From<&DocumentSnapshot> for SessionEntry {
    fn from(snapshot: &DocumentSnapshot) -> Self {
        let last_modified = DateTime::<Utc>::from_timestamp_millis(snapshot.last_modified_ms)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            session_code: snapshot.session_code.clone(),
            last_modified,
        }
    }
}

/// One file per session under `dir`, named after the hex-encoded session code.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        log::info!("Storing documents in {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, session_code: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(session_code), EXTENSION))
    }

    pub async fn write(
        &self,
        session_code: &str,
        content: &str,
    ) -> Result<DocumentSnapshot, StoreError> {
        let snapshot = DocumentSnapshot {
            session_code: session_code.to_owned(),
            content: content.to_owned(),
            last_modified_ms: Utc::now().timestamp_millis(),
        };
        let bytes = bincode::serialize(&snapshot)?;
        let path = self.path_for(session_code);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;
        log::info!(
            "Document saved for session {} ({} bytes)",
            session_code,
            content.len()
        );
        Ok(snapshot)
    }

    pub async fn read(&self, session_code: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        match fs::read(self.path_for(session_code)).await {
            Ok(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Every stored session, most recently modified first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<SessionEntry>, StoreError> {
        let mut snapshots = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let decoded = fs::read(&path)
                .await
                .map_err(StoreError::from)
                .and_then(|bytes| Ok(bincode::deserialize::<DocumentSnapshot>(&bytes)?));
            match decoded {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => log::warn!("Skipping {}: {}", path.display(), err),
            }
        }
        snapshots.sort_by(|a, b| b.last_modified_ms.cmp(&a.last_modified_ms));
        Ok(snapshots.iter().map(SessionEntry::from).collect())
    }
}
