use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub title: String,
    pub grades: Vec<String>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("subject title must not be empty")]
    EmptyTitle,

    #[error("no subject with id {0}")]
    UnknownSubject(u64),

    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize subjects: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

type Subjects = BTreeMap<u64, Subject>;

/// Process-wide subject records with write-through persistence.
///
/// All access goes through one mutex. Mutations are applied to a copy,
/// written to disk, and only then swapped in, so memory never runs ahead of
/// the file and readers never see a half-applied change.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    subjects: Mutex<Subjects>,
}

impl RecordStore {
    /// Opens the store backed by `path`. A missing file starts empty; an
    /// unreadable or corrupt one is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> RecordStore {
        let path = path.into();
        let subjects = load(&path);
        RecordStore {
            path,
            subjects: Mutex::new(subjects),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the subject titled `title`, creating it with the next free id.
    pub fn find_or_create(&self, title: &str) -> Result<Subject, StoreError> {
        self.commit(|subjects| {
            let id = find_or_insert(subjects, title)?;
            Ok(subjects[&id].clone())
        })
    }

    pub fn append_grade(&self, id: u64, grade: &str) -> Result<Subject, StoreError> {
        self.commit(|subjects| {
            let subject = subjects
                .get_mut(&id)
                .ok_or(StoreError::UnknownSubject(id))?;
            subject.grades.push(grade.to_string());
            Ok(subject.clone())
        })
    }

    /// Find-or-create plus append in a single critical section.
    pub fn record_grade(&self, title: &str, grade: &str) -> Result<Subject, StoreError> {
        self.commit(|subjects| {
            let id = find_or_insert(subjects, title)?;
            let subject = subjects
                .get_mut(&id)
                .ok_or(StoreError::UnknownSubject(id))?;
            subject.grades.push(grade.to_string());
            Ok(subject.clone())
        })
    }

    /// Point-in-time copy of all subjects in id order.
    pub fn snapshot(&self) -> Vec<Subject> {
        self.lock().values().cloned().collect()
    }

    /// Rewrites the backing file from the current in-memory state.
    pub fn persist(&self) -> Result<(), StoreError> {
        let subjects = self.lock();
        save(&self.path, &subjects)
    }

    fn commit<T>(
        &self,
        f: impl FnOnce(&mut Subjects) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut subjects = self.lock();
        let mut next = subjects.clone();
        let out = f(&mut next)?;

        if next != *subjects {
            save(&self.path, &next).inspect_err(|e| error!(cause = %e, "failed to persist subjects"))?;
            *subjects = next;
        }
        Ok(out)
    }

    fn lock(&self) -> MutexGuard<'_, Subjects> {
        // every critical section leaves the map consistent
        self.subjects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_or_insert(subjects: &mut Subjects, title: &str) -> Result<u64, StoreError> {
    if title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    if let Some(existing) = subjects.values().find(|s| s.title == title) {
        return Ok(existing.id);
    }

    let id = subjects.keys().next_back().map_or(1, |max| max + 1);
    debug!(id, title, "creating subject");
    subjects.insert(
        id,
        Subject {
            id,
            title: title.to_string(),
            grades: Vec::new(),
        },
    );
    Ok(id)
}

fn load(path: &Path) -> Subjects {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no saved subjects, starting empty");
            return Subjects::new();
        }
        Err(e) => {
            warn!(path = %path.display(), cause = %e, "failed to load saved data");
            return Subjects::new();
        }
    };

    let list = match serde_json::from_slice::<Vec<Subject>>(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(path = %path.display(), cause = %e, "failed to load saved data");
            return Subjects::new();
        }
    };

    let mut subjects = Subjects::new();
    let mut titles = HashSet::with_capacity(list.len());
    for subject in list {
        if !titles.insert(subject.title.clone()) || subjects.contains_key(&subject.id) {
            warn!(
                path = %path.display(),
                id = subject.id,
                title = %subject.title,
                "duplicate subject in saved data, starting empty"
            );
            return Subjects::new();
        }
        subjects.insert(subject.id, subject);
    }
    subjects
}

fn save(path: &Path, subjects: &Subjects) -> Result<(), StoreError> {
    let list: Vec<&Subject> = subjects.values().collect();
    let mut data = serde_json::to_vec_pretty(&list)?;
    data.push(b'\n');

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, &data).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
pub(crate) fn temp_data_file(name: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static SEQ: AtomicUsize = AtomicUsize::new(0);

    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "grade-book-{}-{}-{}.json",
        std::process::id(),
        name,
        n
    ));
    let _ = fs::remove_file(&path);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn missing_file_starts_empty() {
        let path = temp_data_file("missing");
        let store = RecordStore::open(&path);
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_data_file("corrupt");
        fs::write(&path, b"{ not json").unwrap();

        let store = RecordStore::open(&path);
        assert!(store.is_empty());

        // the next write replaces the corrupt content
        store.record_grade("Math", "5").unwrap();
        assert_eq!(RecordStore::open(&path).len(), 1);
    }

    #[test]
    fn find_or_create_assigns_increasing_ids() {
        let store = RecordStore::open(temp_data_file("ids"));

        let math = store.find_or_create("Math").unwrap();
        let physics = store.find_or_create("Physics").unwrap();
        let again = store.find_or_create("Math").unwrap();

        assert_eq!(math.id, 1);
        assert_eq!(physics.id, 2);
        assert_eq!(again, math);
        assert!(math.grades.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn titles_match_exactly() {
        let store = RecordStore::open(temp_data_file("exact"));
        store.record_grade("Math", "5").unwrap();
        store.record_grade("math", "4").unwrap();
        store.record_grade("Math ", "3").unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn next_id_follows_the_largest_loaded_id() {
        let path = temp_data_file("max-id");
        fs::write(
            &path,
            r#"[{"id": 7, "title": "History", "grades": ["3"]},
               {"id": 2, "title": "Art", "grades": []}]"#,
        )
        .unwrap();

        let store = RecordStore::open(&path);
        let created = store.find_or_create("Music").unwrap();
        assert_eq!(created.id, 8);

        let ids: Vec<u64> = store.snapshot().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 7, 8]);
    }

    #[test]
    fn append_grade_keeps_order_and_rejects_unknown_ids() {
        let store = RecordStore::open(temp_data_file("append"));
        let math = store.find_or_create("Math").unwrap();

        store.append_grade(math.id, "5").unwrap();
        let updated = store.append_grade(math.id, "4").unwrap();
        assert_eq!(updated.grades, vec!["5", "4"]);

        assert!(matches!(
            store.append_grade(99, "3"),
            Err(StoreError::UnknownSubject(99))
        ));
        assert!(matches!(
            store.find_or_create(""),
            Err(StoreError::EmptyTitle)
        ));
    }

    #[test]
    fn snapshot_is_detached_from_the_store() {
        let store = RecordStore::open(temp_data_file("snapshot"));
        store.record_grade("Math", "5").unwrap();

        let mut snap = store.snapshot();
        snap[0].grades.push("tampered".to_string());

        assert_eq!(store.snapshot()[0].grades, vec!["5"]);
    }

    #[test]
    fn reopened_store_reconstructs_identical_records() {
        let path = temp_data_file("roundtrip");
        let store = RecordStore::open(&path);
        store.record_grade("Math", "5").unwrap();
        store.record_grade("Физика", "отлично").unwrap();
        store.record_grade("Math", "4").unwrap();

        let reopened = RecordStore::open(&path);
        assert_eq!(reopened.snapshot(), store.snapshot());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Физика"));
        assert!(text.contains("\n  {\n    \"id\": 1,"));
    }

    #[test]
    fn duplicate_titles_or_ids_in_saved_data_start_empty() {
        let path = temp_data_file("dup-title");
        fs::write(
            &path,
            r#"[{"id": 1, "title": "Math", "grades": ["5"]},
               {"id": 2, "title": "Math", "grades": ["4"]}]"#,
        )
        .unwrap();
        assert!(RecordStore::open(&path).is_empty());

        let path = temp_data_file("dup-id");
        fs::write(
            &path,
            r#"[{"id": 1, "title": "Math", "grades": ["5"]},
               {"id": 1, "title": "Art", "grades": []}]"#,
        )
        .unwrap();
        assert!(RecordStore::open(&path).is_empty());
    }

    #[test]
    fn persist_rewrites_the_backing_file() {
        let path = temp_data_file("persist");
        let store = RecordStore::open(&path);
        store.record_grade("Math", "5").unwrap();
        store.record_grade("Art", "3").unwrap();

        fs::remove_file(&path).unwrap();
        assert!(RecordStore::open(&path).is_empty());

        store.persist().unwrap();
        assert_eq!(RecordStore::open(&path).snapshot(), store.snapshot());
    }

    #[test]
    fn failed_persist_leaves_memory_untouched() {
        let dir = temp_data_file("no-such-dir");
        let store = RecordStore::open(dir.join("grades.json"));

        assert!(matches!(
            store.record_grade("Math", "5"),
            Err(StoreError::Io { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_creates_never_duplicate() {
        let store = Arc::new(RecordStore::open(temp_data_file("concurrent")));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.record_grade(&format!("subject-{}", i % 4), "5").unwrap();
                    store.record_grade(&format!("unique-{i}"), "5").unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = store.snapshot();
        assert_eq!(snap.len(), 20);
        let shared: usize = snap
            .iter()
            .filter(|s| s.title.starts_with("subject-"))
            .map(|s| s.grades.len())
            .sum();
        assert_eq!(shared, 16);

        let mut ids: Vec<u64> = snap.iter().map(|s| s.id).collect();
        ids.dedup();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }
}
