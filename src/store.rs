//! Persistence of the name directory and the run history.
//!
//! Both files are rewritten whole through a temp file in the same directory, so a
//! failed write leaves the previous content in place.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::StoreConfig;
use crate::error::PersistenceError;
use crate::status::{NameDirectory, Snapshot};

/// Stored runs by timestamp key. Key order is chronological.
pub type History = BTreeMap<String, Snapshot>;

/// A snapshot tagged with its capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub captured_at: DateTime<Local>,
    pub snapshot: Snapshot,
}

impl RunRecord {
    pub fn new(captured_at: DateTime<Local>, snapshot: Snapshot) -> RunRecord {
        RunRecord {
            captured_at,
            snapshot,
        }
    }

    /// Unix seconds with millisecond precision, e.g. `1760600000.123`.
    pub fn key(&self) -> String {
        format!(
            "{}.{:03}",
            self.captured_at.timestamp(),
            self.captured_at.timestamp_subsec_millis().min(999)
        )
    }

    /// Local time as `10/16/26 14:30`.
    pub fn display_time(&self) -> String {
        self.captured_at.format("%m/%d/%y %H:%M").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    names_path: PathBuf,
    records_path: PathBuf,
}

impl Store {
    pub fn new(config: &StoreConfig) -> Store {
        Store {
            names_path: config.names_path.clone(),
            records_path: config.records_path.clone(),
        }
    }

    pub fn names_path(&self) -> &Path {
        &self.names_path
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    /// Replaces the persisted directory wholesale.
    pub fn save_names(&self, names: &NameDirectory) -> Result<(), PersistenceError> {
        write_json(&self.names_path, names)?;
        debug!("saved {} lot names to {}", names.len(), self.names_path.display());
        Ok(())
    }

    pub fn load_names(&self) -> Result<NameDirectory, PersistenceError> {
        Ok(read_json(&self.names_path)?.unwrap_or_default())
    }

    /// Loads the full history. A missing file is an empty history.
    pub fn load_history(&self) -> Result<History, PersistenceError> {
        Ok(read_json(&self.records_path)?.unwrap_or_default())
    }

    /// Appends one run and rewrites the history. Returns the number of stored runs.
    ///
    /// A record whose key is already stored, or older than the newest stored key,
    /// is refused and the store is left untouched.
    pub fn append_run(&self, record: &RunRecord) -> Result<usize, PersistenceError> {
        let mut history = self.load_history()?;
        let key = record.key();
        if history.contains_key(&key) {
            return Err(PersistenceError::DuplicateTimestamp(key));
        }
        if let Some(latest) = history.keys().next_back() {
            if *latest > key {
                return Err(PersistenceError::OutOfOrder {
                    key,
                    latest: latest.clone(),
                });
            }
        }
        history.insert(key, record.snapshot.clone());
        write_json(&self.records_path, &history)?;
        info!(
            "appended run {} to {} ({} runs)",
            record.key(),
            self.records_path.display(),
            history.len()
        );
        Ok(history.len())
    }
}

fn read_json<T>(path: &Path) -> Result<Option<T>, PersistenceError>
where
    T: serde::de::DeserializeOwned,
{
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(ref error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(PersistenceError::io(
                format!("reading {}", path.display()),
                error,
            ))
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| PersistenceError::Json {
            path: path.display().to_string(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let data = serde_json::to_vec(value).map_err(|source| PersistenceError::Json {
        path: path.display().to_string(),
        source,
    })?;
    write_atomic(path, &data)
}

fn write_atomic(target: &Path, data: &[u8]) -> Result<(), PersistenceError> {
    write_atomic_with(target, |file| file.write_all(data))
}

/// Runs `write` against a temp file beside `target` and renames it over `target`
/// only once `write` and the sync succeed. On failure the temp file is removed.
fn write_atomic_with<F>(target: &Path, write: F) -> Result<(), PersistenceError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent).map_err(|error| {
        PersistenceError::io(format!("creating temp file in {}", parent.display()), error)
    })?;

    let file = temp.as_file_mut();
    write(&mut *file).map_err(|error| {
        PersistenceError::io(format!("writing temp file for {}", target.display()), error)
    })?;
    file.sync_all().map_err(|error| {
        PersistenceError::io(format!("syncing temp file for {}", target.display()), error)
    })?;

    temp.persist(target).map_err(|error| {
        PersistenceError::io(format!("renaming temp file to {}", target.display()), error.error)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{LotId, StatusCategory};
    use chrono::TimeZone;
    use matches::assert_matches;

    fn store_in(dir: &Path) -> Store {
        Store::new(&StoreConfig {
            names_path: dir.join("lotNames.json"),
            records_path: dir.join("lotRecords.json"),
        })
    }

    fn record_at(secs: i64, category: StatusCategory) -> RunRecord {
        let mut snapshot = Snapshot::new();
        snapshot.record(LotId::from("19"), category);
        snapshot.record(LotId::from("42"), StatusCategory::Unknown);
        RunRecord::new(Local.timestamp_opt(secs, 250_000_000).unwrap(), snapshot)
    }

    #[test]
    fn test_record_key_has_millis() {
        assert_eq!("1760600000.250", record_at(1_760_600_000, StatusCategory::Full).key());
    }

    #[test]
    fn test_append_to_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let record = record_at(1_760_600_000, StatusCategory::Full);
        let stored = store.append_run(&record).unwrap();

        assert_eq!(1, stored);
        let text = fs::read_to_string(store.records_path()).unwrap();
        assert_eq!(r#"{"1760600000.250":{"19":"full","42":"na"}}"#, text);
    }

    #[test]
    fn test_append_keeps_previous_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let first = record_at(1_760_600_000, StatusCategory::Full);
        let second = record_at(1_760_601_800, StatusCategory::Available);

        store.append_run(&first).unwrap();
        let stored = store.append_run(&second).unwrap();

        let history = store.load_history().unwrap();
        assert_eq!(2, stored);
        assert_eq!(Some(&first.snapshot), history.get(&first.key()));
        assert_eq!(Some(&second.snapshot), history.get(&second.key()));
    }

    #[test]
    fn test_legacy_store_is_extended() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(
            store.records_path(),
            r#"{"1697461200.4567": {"19": "few", "7": "/pics/ParkingIcons/x.png"}}"#,
        )
        .unwrap();

        store.append_run(&record_at(1_760_600_000, StatusCategory::Full)).unwrap();

        let history = store.load_history().unwrap();
        let legacy = &history["1697461200.4567"];
        assert_eq!(Some(&StatusCategory::Few), legacy.get(&LotId::from("19")));
        assert_eq!(
            Some(&StatusCategory::Raw(String::from("/pics/ParkingIcons/x.png"))),
            legacy.get(&LotId::from("7"))
        );
    }

    #[test]
    fn test_duplicate_and_older_records_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let record = record_at(1_760_600_000, StatusCategory::Full);
        store.append_run(&record).unwrap();
        let before = fs::read_to_string(store.records_path()).unwrap();

        assert_matches!(
            store.append_run(&record),
            Err(PersistenceError::DuplicateTimestamp(_))
        );
        assert_matches!(
            store.append_run(&record_at(1_760_500_000, StatusCategory::Full)),
            Err(PersistenceError::OutOfOrder { .. })
        );
        assert_eq!(before, fs::read_to_string(store.records_path()).unwrap());
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.records_path(), "{ truncated").unwrap();

        assert_matches!(
            store.append_run(&record_at(1_760_600_000, StatusCategory::Full)),
            Err(PersistenceError::Json { .. })
        );
        assert_eq!("{ truncated", fs::read_to_string(store.records_path()).unwrap());
    }

    #[test]
    fn test_save_names_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut names = NameDirectory::new();
        names.insert(LotId::from("19"), String::from("דיזנגוף סנטר"));
        names.insert(LotId::from("42"), String::from("Ibn Gvirol"));

        store.save_names(&names).unwrap();
        let first = fs::read(store.names_path()).unwrap();
        store.save_names(&names).unwrap();
        let second = fs::read(store.names_path()).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(second).unwrap().contains("דיזנגוף"));
        assert_eq!(names, store.load_names().unwrap());
    }

    #[test]
    fn test_save_names_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let mut old = NameDirectory::new();
        old.insert(LotId::from("1"), String::from("Gone"));
        let mut new = NameDirectory::new();
        new.insert(LotId::from("2"), String::from("Here"));

        store.save_names(&old).unwrap();
        store.save_names(&new).unwrap();

        assert_eq!(new, store.load_names().unwrap());
    }

    #[test]
    fn test_interrupted_write_keeps_stored_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.append_run(&record_at(1_760_600_000, StatusCategory::Full)).unwrap();
        let before = fs::read(store.records_path()).unwrap();

        let result = write_atomic_with(store.records_path(), |file| {
            file.write_all(br#"{"1760601800.250":{"19":"#)?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        });

        assert_matches!(result, Err(PersistenceError::Io { .. }));
        assert_eq!(before, fs::read(store.records_path()).unwrap());
        let left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(vec![std::ffi::OsString::from("lotRecords.json")], left);
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&StoreConfig {
            names_path: dir.path().join("missing").join("lotNames.json"),
            records_path: dir.path().join("missing").join("lotRecords.json"),
        });

        assert_matches!(
            store.save_names(&NameDirectory::new()),
            Err(PersistenceError::Io { .. })
        );
    }
}
