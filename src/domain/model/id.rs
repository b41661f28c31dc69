use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 本のID。生成時刻（Unixミリ秒）由来の整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// 時刻由来かつ単調増加のID発行器。
///
/// 同一ミリ秒内の連続発行や時計の巻き戻りでは `last + 1` を返すため、
/// 発行済みIDと衝突しない。`i64::MAX` に達した後は `None`。
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存IDより大きい値から発行するよう調整する。
    pub fn observe(&mut self, id: BookId) {
        self.last = self.last.max(id.0);
    }

    pub fn next_id(&mut self) -> Option<BookId> {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = now.max(self.last.checked_add(1)?);
        Some(BookId(self.last))
    }
}
