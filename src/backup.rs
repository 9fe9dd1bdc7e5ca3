use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Copy `path` to a timestamp-suffixed sibling before it gets overwritten.
///
/// The backup lands next to the original as `<name>.bak.<YYYYMMDD-HHMMSS>`,
/// readable at a glance and collision-resistant at second granularity.
/// A missing source returns `Ok(None)`; there is nothing to protect. Any
/// copy failure is an error; callers must not overwrite the original until
/// a backup exists on disk.
pub fn create_backup<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("cannot derive backup name for {}", path.display()))?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_name = format!("{}.bak.{stamp}", file_name.to_string_lossy());
    let backup_path = path.with_file_name(backup_name);

    fs::copy(path, &backup_path).with_context(|| {
        format!(
            "failed to back up {} to {}",
            path.display(),
            backup_path.display()
        )
    })?;

    log::debug!("backed up {} -> {}", path.display(), backup_path.display());

    Ok(Some(backup_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_copies_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".bash_history");
        fs::write(&path, "# 1000\nls\n").unwrap();

        let backup = create_backup(&path).unwrap().unwrap();
        assert!(backup.exists());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "# 1000\nls\n");

        // Original untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "# 1000\nls\n");
    }

    #[test]
    fn test_backup_name_carries_marker_and_stamp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "ls\n").unwrap();

        let backup = create_backup(&path).unwrap().unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("history.bak."));
        // Stamp is YYYYMMDD-HHMMSS
        let stamp = name.strip_prefix("history.bak.").unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "-");
    }

    #[test]
    fn test_backup_of_missing_file_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = create_backup(dir.path().join("absent")).unwrap();
        assert!(result.is_none());
    }
}
