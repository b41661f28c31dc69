//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bookshelf_mcp::application::service::ShelfService;
use bookshelf_mcp::domain::model::book::{NewBook, Year};
use bookshelf_mcp::domain::storage::KeyValueStorage;

// =============================================================================
// InMemoryStorage — テスト用の保存先
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("in-memory store error")]
pub struct InMemoryError;

/// ファイルI/O不要のインメモリ保存先。
/// clone は同じ中身を共有する（再起動を模したテスト用）。
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    unavailable: Rc<Cell<bool>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存先が無い環境を模す。
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStorage for InMemoryStorage {
    type Error = InMemoryError;

    fn is_available(&self) -> bool {
        !self.unavailable.get()
    }

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.put_raw(key, value);
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn new_book(title: &str, author: &str, year: i32, is_completed: bool) -> NewBook {
    NewBook {
        title: title.into(),
        author: author.into(),
        year: Year::new(year),
        is_completed,
    }
}

/// 起動済みのServiceを返す。
pub fn started_service(storage: &InMemoryStorage) -> ShelfService<InMemoryStorage> {
    let mut svc = ShelfService::new(storage.clone());
    svc.start().unwrap();
    svc
}

/// 標準的なテスト用の本棚:
/// ```text
/// To read:   Foundation (Isaac Asimov, 1951), Neuromancer (William Gibson, 1984)
/// Completed: Dune (Frank Herbert, 1965)
/// ```
pub fn standard_service(storage: &InMemoryStorage) -> ShelfService<InMemoryStorage> {
    let mut svc = started_service(storage);
    svc.add_book(new_book("Dune", "Frank Herbert", 1965, true))
        .unwrap();
    svc.add_book(new_book("Foundation", "Isaac Asimov", 1951, false))
        .unwrap();
    svc.add_book(new_book("Neuromancer", "William Gibson", 1984, false))
        .unwrap();
    svc
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
