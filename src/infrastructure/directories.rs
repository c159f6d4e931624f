use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub db_path: PathBuf,
}

/// Creates the log and data directories and checks the data directory is
/// writable before the database is opened there.
pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let data_dir = ensure_dir(&cfg.data_dir)?;

    let probe_file = data_dir.join(".write-test");
    fs::write(&probe_file, b"ok")
        .with_context(|| format!("data directory {} is not writable", data_dir.display()))?;
    fs::remove_file(&probe_file)?;

    Ok(ResolvedPaths {
        logs_dir,
        db_path: data_dir.join(&cfg.db_filename),
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {path}"))?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(&dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o755);
            let _ = fs::set_permissions(&dir, perms);
        }
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn creates_nested_directories_and_resolves_db_path() {
        let root = std::env::temp_dir().join(format!("bookmark-ai-{}", Uuid::new_v4().simple()));
        let cfg = DirectoryConfig {
            logs_dir: root.join("logs").display().to_string(),
            data_dir: root.join("nested/data").display().to_string(),
            db_filename: "test.db".to_string(),
        };

        let paths = ensure_directories(&cfg).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(paths.db_path.ends_with("nested/data/test.db"));
        assert!(!paths.db_path.exists());

        fs::remove_dir_all(&root).unwrap();
    }
}
