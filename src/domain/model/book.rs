use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::id::BookId;
use crate::domain::error::DomainError;

/// 出版年。数値としても数字文字列としても読み込める（旧データはフォーム入力の文字列）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Year(i32);

impl Year {
    pub fn new(year: i32) -> Self {
        Self(year)
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| DomainError::InvalidYear(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// 本の追加リクエスト
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: Year,
    pub is_completed: bool,
}

/// 本棚の1エントリ。Shelfが所有し、Shelfを通じて変更する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    year: Year,
    is_completed: bool,
}

impl Book {
    pub(crate) fn new(id: BookId, req: NewBook) -> Self {
        Self {
            id,
            title: req.title,
            author: req.author,
            year: req.year,
            is_completed: req.is_completed,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub(crate) fn set_completed(&mut self, value: bool) {
        self.is_completed = value;
    }
}
