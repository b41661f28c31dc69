use crate::domain::model::book::Book;
use crate::domain::storage::KeyValueStorage;

use super::error::AppError;

/// 本棚を保存するキー
pub const STORAGE_KEY: &str = "BOOK_SHELF";

/// 本棚 ⇔ キーバリュー保存先の変換。
/// 本の配列をJSON文字列として固定キーに保存する。
pub struct ShelfPersistence<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> ShelfPersistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_available()
    }

    /// 全件をシリアライズして保存し、保存したJSONを返す。
    pub fn save(&self, books: &[Book]) -> Result<String, AppError> {
        if !self.storage.is_available() {
            return Err(AppError::StorageUnavailable);
        }
        let serialized = serde_json::to_string(books)?;
        self.storage
            .set(STORAGE_KEY, &serialized)
            .map_err(|e| AppError::Storage(Box::new(e)))?;
        Ok(serialized)
    }

    /// 保存済みの本を読み込む。キーが無い・壊れている場合は空。
    /// 配列としては読めるが一部の本だけ壊れている場合は、その本だけ読み飛ばす。
    pub fn load(&self) -> Result<Vec<Book>, AppError> {
        if !self.storage.is_available() {
            return Err(AppError::StorageUnavailable);
        }
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "stored shelf could not be read; starting empty");
                return Ok(Vec::new());
            }
        };
        let records = match serde_json::from_str::<Option<Vec<serde_json::Value>>>(&raw) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "stored shelf is malformed; starting empty");
                return Ok(Vec::new());
            }
        };
        Ok(records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let id = record.get("id").cloned();
                serde_json::from_value::<Book>(record)
                    .map_err(|e| {
                        tracing::warn!(index, ?id, error = %e, "skipping malformed stored book");
                    })
                    .ok()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use super::*;
    use crate::domain::model::book::{NewBook, Year};
    use crate::domain::model::shelf::Shelf;

    #[derive(Debug, thiserror::Error)]
    #[error("test storage error")]
    struct TestError;

    #[derive(Default)]
    struct TestStorage {
        entries: RefCell<HashMap<String, String>>,
        unavailable: Cell<bool>,
    }

    impl KeyValueStorage for TestStorage {
        type Error = TestError;

        fn is_available(&self) -> bool {
            !self.unavailable.get()
        }

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn sample_shelf() -> Shelf {
        let mut shelf = Shelf::new();
        shelf.add(NewBook {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: Year::new(1965),
            is_completed: true,
        });
        shelf.add(NewBook {
            title: "Foundation".into(),
            author: "Isaac Asimov".into(),
            year: Year::new(1951),
            is_completed: false,
        });
        shelf
    }

    #[test]
    fn save_then_load_roundtrip() {
        let persistence = ShelfPersistence::new(TestStorage::default());
        let shelf = sample_shelf();

        persistence.save(shelf.books()).unwrap();
        let loaded = persistence.load().unwrap();

        assert_eq!(loaded, shelf.books());
    }

    #[test]
    fn missing_key_loads_empty() {
        let persistence = ShelfPersistence::new(TestStorage::default());
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_and_null_load_empty() {
        let persistence = ShelfPersistence::new(TestStorage::default());
        for raw in [
            "not json",
            "{\"id\": 1}",
            "null",
            "[{\"title\": \"no id\"}]",
            "[1, \"x\"]",
        ] {
            persistence.storage().set(STORAGE_KEY, raw).unwrap();
            assert!(persistence.load().unwrap().is_empty(), "raw: {raw}");
        }
    }

    #[test]
    fn legacy_string_year_loads() {
        let persistence = ShelfPersistence::new(TestStorage::default());
        persistence
            .storage()
            .set(
                STORAGE_KEY,
                r#"[{"id":1700000000000,"title":"A","author":"X","year":"2020","isCompleted":false}]"#,
            )
            .unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].year(), Year::new(2020));
    }

    #[test]
    fn malformed_record_is_skipped_alone() {
        let persistence = ShelfPersistence::new(TestStorage::default());
        persistence
            .storage()
            .set(
                STORAGE_KEY,
                r#"[
                    {"id":1,"title":"Dune","author":"Frank Herbert","year":1965,"isCompleted":true},
                    {"id":2,"title":"Blank","author":"X","year":"","isCompleted":false},
                    {"id":3,"title":"Foundation","author":"Isaac Asimov","year":"1951","isCompleted":false}
                ]"#,
            )
            .unwrap();

        let loaded = persistence.load().unwrap();

        let titles: Vec<&str> = loaded.iter().map(|b| b.title()).collect();
        assert_eq!(titles, ["Dune", "Foundation"]);
    }

    #[test]
    fn unavailable_storage_is_reported() {
        let storage = TestStorage::default();
        storage.unavailable.set(true);
        let persistence = ShelfPersistence::new(storage);

        assert!(matches!(
            persistence.save(sample_shelf().books()),
            Err(AppError::StorageUnavailable)
        ));
        assert!(matches!(
            persistence.load(),
            Err(AppError::StorageUnavailable)
        ));
    }
}
