use std::collections::HashSet;

use super::book::{Book, NewBook};
use super::id::{BookId, IdGenerator};

/// 本棚 — 集約ルート。挿入順を保った本のリストで、全ての変更はここを経由する。
#[derive(Debug, Clone, Default)]
pub struct Shelf {
    books: Vec<Book>,
    ids: IdGenerator,
}

/// 表示用の2セクション（未読 / 読了）。どちらも本棚の並び順。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfView<'a> {
    pub to_read: Vec<&'a Book>,
    pub completed: Vec<&'a Book>,
}

impl ShelfView<'_> {
    pub fn len(&self) -> usize {
        self.to_read.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Shelf {
    pub fn new() -> Self {
        Self::default()
    }

    /// 読み込んだスナップショットを採用する。重複IDは先勝ちで後続を捨てる。
    pub fn from_books(books: Vec<Book>) -> Self {
        let mut shelf = Self::new();
        let mut seen = HashSet::new();
        for book in books {
            if !seen.insert(book.id()) {
                tracing::warn!(
                    id = %book.id(),
                    title = book.title(),
                    "dropping book with duplicate id"
                );
                continue;
            }
            shelf.ids.observe(book.id());
            shelf.books.push(book);
        }
        shelf
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// 新しいIDを発行して末尾に追加する。
    pub fn add(&mut self, req: NewBook) -> BookId {
        let id = match self.ids.next_id() {
            Some(id) => id,
            None => self.unused_id_from_top(),
        };
        self.books.push(Book::new(id, req));
        id
    }

    /// `i64::MAX` から下に向かって、未使用の最初のID。
    /// 本の数は有限なので必ず見つかる。
    fn unused_id_from_top(&self) -> BookId {
        let mut candidate = i64::MAX;
        while self.find_by_id(BookId::new(candidate)).is_some() {
            candidate = candidate.saturating_sub(1);
        }
        tracing::warn!(id = candidate, "time-derived ids exhausted; reusing a free id");
        BookId::new(candidate)
    }

    pub fn find_by_id(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    pub fn find_index_by_id(&self, id: BookId) -> Option<usize> {
        self.books.iter().position(|b| b.id() == id)
    }

    /// 読了フラグを設定する。該当なしなら何もせず false。
    pub fn set_completed(&mut self, id: BookId, value: bool) -> bool {
        match self.books.iter_mut().find(|b| b.id() == id) {
            Some(book) => {
                book.set_completed(value);
                true
            }
            None => false,
        }
    }

    /// IDで削除する。該当なしなら何もしない。
    pub fn remove(&mut self, id: BookId) -> Option<Book> {
        let index = self.find_index_by_id(id)?;
        Some(self.books.remove(index))
    }

    /// タイトルの部分一致（大文字小文字無視）。空クエリは全件。
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Book> + 'a {
        let needle = query.trim().to_lowercase();
        self.books
            .iter()
            .filter(move |b| needle.is_empty() || b.title().to_lowercase().contains(&needle))
    }

    pub fn view(&self, query: &str) -> ShelfView<'_> {
        let (completed, to_read): (Vec<&Book>, Vec<&Book>) =
            self.search(query).partition(|b| b.is_completed());
        ShelfView { to_read, completed }
    }
}
