//! Bearer token persistence across runs.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use knock_logging::{knock_info, knock_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct PersistedSession {
    access_token: String,
}

/// Returns the stored token, or `None` when there is none or it is unreadable.
pub(crate) fn load_token(path: &Path) -> Option<String> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            knock_warn!("Failed to read session from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedSession>(&content) {
        Ok(session) if !session.access_token.is_empty() => {
            knock_info!("Restored session from {:?}", path);
            Some(session.access_token)
        }
        Ok(_) => None,
        Err(err) => {
            knock_warn!("Failed to parse session from {:?}: {}", path, err);
            None
        }
    }
}

/// Writes the token through a temp file in the same directory, then renames it.
pub(crate) fn save_token(path: &Path, token: &str) -> Result<(), PersistError> {
    let session = PersistedSession {
        access_token: token.to_string(),
    };
    let content = ron::ser::to_string_pretty(&session, ron::ser::PrettyConfig::new())?;

    let dir = parent_dir(path);
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    restrict_permissions(tmp.as_file())?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

pub(crate) fn clear_token(path: &Path) -> Result<(), PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".knock_session.ron");

        save_token(&path, "tok-abc").unwrap();
        assert_eq!(load_token(&path).as_deref(), Some("tok-abc"));

        save_token(&path, "tok-def").unwrap();
        assert_eq!(load_token(&path).as_deref(), Some("tok-def"));
    }

    #[test]
    fn missing_or_garbled_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".knock_session.ron");
        assert_eq!(load_token(&path), None);

        fs::write(&path, "not ron at all (").unwrap();
        assert_eq!(load_token(&path), None);
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".knock_session.ron");
        save_token(&path, "tok").unwrap();

        clear_token(&path).unwrap();
        assert!(!path.exists());
        clear_token(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".knock_session.ron");
        save_token(&path, "tok").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
