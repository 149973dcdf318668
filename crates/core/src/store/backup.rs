//! Startup backups of the database file. A copy (plus WAL/SHM side files)
//! is taken before the pool opens an existing database; only the most
//! recent few are kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

const MAX_BACKUPS: usize = 5;
const PREFIX: &str = "integron-";
const SUFFIX: &str = ".db";

/// Copy `db_path` into `backup_dir` under a timestamped name and prune old
/// backups. Returns the backup path, or `None` when there is nothing to
/// back up yet.
pub fn create_backup(db_path: &Path, backup_dir: &Path) -> io::Result<Option<PathBuf>> {
    if !db_path.exists() {
        return Ok(None);
    }

    fs::create_dir_all(backup_dir)?;

    // Lexicographically sortable, filesystem-safe timestamp.
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f");
    let backup_path = backup_dir.join(format!("{PREFIX}{timestamp}{SUFFIX}"));

    fs::copy(db_path, &backup_path)?;
    copy_side_file(db_path, &backup_path, "-wal")?;
    copy_side_file(db_path, &backup_path, "-shm")?;

    cleanup_old_backups(backup_dir)?;

    Ok(Some(backup_path))
}

fn copy_side_file(db_path: &Path, backup_path: &Path, extension: &str) -> io::Result<()> {
    let source = sibling(db_path, extension);
    if source.exists() {
        fs::copy(source, sibling(backup_path, extension))?;
    }
    Ok(())
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(extension);
    PathBuf::from(name)
}

fn cleanup_old_backups(backup_dir: &Path) -> io::Result<()> {
    let mut backups: Vec<PathBuf> = fs::read_dir(backup_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(PREFIX) && name.ends_with(SUFFIX))
        })
        .collect();

    // Timestamped names sort chronologically; newest last.
    backups.sort();

    let excess = backups.len().saturating_sub(MAX_BACKUPS);
    for stale in backups.into_iter().take(excess) {
        fs::remove_file(&stale)?;
        for extension in ["-wal", "-shm"] {
            let side = sibling(&stale, extension);
            if side.exists() {
                fs::remove_file(side)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_database_backs_up_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_backup(&dir.path().join("absent.db"), &dir.path().join("backups"));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn backup_copies_database_and_side_files() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("integron.db");
        fs::write(&db, b"main").unwrap();
        fs::write(sibling(&db, "-wal"), b"wal").unwrap();

        let backup_dir = dir.path().join("backups");
        let backup = create_backup(&db, &backup_dir).unwrap().unwrap();

        assert_eq!(fs::read(&backup).unwrap(), b"main");
        assert_eq!(fs::read(sibling(&backup, "-wal")).unwrap(), b"wal");
        assert!(!sibling(&backup, "-shm").exists());
    }

    #[test]
    fn only_the_newest_backups_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path().join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        // Seed seven stale backups with ascending timestamps.
        for i in 0..7 {
            let name = format!("{PREFIX}2024-01-0{}T00-00-00.000{SUFFIX}", i + 1);
            fs::write(backup_dir.join(name), b"old").unwrap();
        }

        let db = dir.path().join("integron.db");
        fs::write(&db, b"main").unwrap();
        create_backup(&db, &backup_dir).unwrap();

        let remaining = fs::read_dir(&backup_dir).unwrap().count();
        assert_eq!(remaining, MAX_BACKUPS);
    }
}
