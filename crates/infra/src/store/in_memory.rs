use std::collections::BTreeMap;
use std::sync::RwLock;

use tutorbook_core::{ExpectedVersion, Record};

use super::{Repository, StoreError};

/// In-memory repository for tests/dev and the single-process server.
#[derive(Debug)]
pub struct InMemoryRepository<R: Record> {
    inner: RwLock<BTreeMap<R::Id, R>>,
}

impl<R: Record> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(kind: &str) -> StoreError {
    StoreError::Unavailable(format!("{kind} store lock poisoned"))
}

impl<R: Record> Repository<R> for InMemoryRepository<R> {
    fn get(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned(R::KIND))?;
        Ok(map.get(&id).cloned())
    }

    fn insert(&self, mut record: R) -> Result<R, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned(R::KIND))?;
        let id = record.id();
        if map.contains_key(&id) {
            return Err(StoreError::DuplicateKey(format!("{} {id}", R::KIND)));
        }
        record.set_version(1);
        map.insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, mut record: R, expected: ExpectedVersion) -> Result<R, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned(R::KIND))?;
        let id = record.id();
        let current = map
            .get(&id)
            .map(Record::version)
            .ok_or_else(|| StoreError::NotFound(R::KIND.to_string()))?;
        if !expected.matches(Some(current)) {
            return Err(StoreError::Conflict(format!(
                "{} {id} (expected: {expected:?}, actual: {current})",
                R::KIND
            )));
        }
        record.set_version(current + 1);
        map.insert(id, record.clone());
        Ok(record)
    }

    fn find(&self, filter: &dyn Fn(&R) -> bool) -> Result<Vec<R>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned(R::KIND))?;
        Ok(map.values().filter(|r| filter(r)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tutorbook_students::{RegisterStudent, Student};

    fn student(first: &str) -> Student {
        Student::register(
            &RegisterStudent {
                first_name: first.to_string(),
                last_name: "Vo".to_string(),
                ..RegisterStudent::default()
            },
            "STU000001".to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn insert_assigns_version_one_and_rejects_duplicates() {
        let repo = InMemoryRepository::new();
        let s = repo.insert(student("An")).unwrap();
        assert_eq!(s.version(), 1);
        assert!(matches!(repo.insert(s), Err(StoreError::DuplicateKey(_))));
    }

    #[test]
    fn stale_update_is_a_conflict() {
        let repo = InMemoryRepository::new();
        let s = repo.insert(student("An")).unwrap();

        let mut first = s.clone();
        first.first_name = "Anh".to_string();
        let saved = repo.update(first, ExpectedVersion::of(&s)).unwrap();
        assert_eq!(saved.version(), 2);

        let mut stale = s.clone();
        stale.first_name = "Ann".to_string();
        let err = repo.update(stale, ExpectedVersion::of(&s)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(repo.get(s.id).unwrap().unwrap().first_name, "Anh");
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let repo: InMemoryRepository<Student> = InMemoryRepository::new();
        let err = repo.update(student("Bao"), ExpectedVersion::Any).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn find_filters_and_counts() {
        let repo = InMemoryRepository::new();
        repo.insert(student("An")).unwrap();
        repo.insert(student("Bao")).unwrap();
        assert_eq!(repo.count(&|s: &Student| s.first_name == "Bao").unwrap(), 1);
        assert!(!repo.exists(&|s: &Student| s.first_name == "Chi").unwrap());
        assert_eq!(repo.list().unwrap().len(), 2);
    }
}
