//! 確認してから変更する2段階プロトコル。
//!
//! 1. `Prompt` を提示して `Confirm::confirm` の結果（yes/no）を待つ
//! 2. yes のときだけ変更を適用し、結果を `Notice` で知らせる

use std::future::Future;

use crate::domain::model::book::Book;

/// 確認ダイアログの内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub text: String,
}

impl Prompt {
    fn are_you_sure(text: &str) -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: text.to_string(),
        }
    }
}

/// yes/no を非同期に返す確認手段。
pub trait Confirm {
    fn confirm(&self, prompt: &Prompt) -> impl Future<Output = bool> + Send;
}

/// 既に決まっている回答をそのまま返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    async fn confirm(&self, _prompt: &Prompt) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
}

/// 確認後に表示する短い通知（トースト）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.to_string(),
        }
    }

    fn info(message: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.to_string(),
        }
    }
}

/// 確認を要する操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied(Notice),
    Declined(Notice),
    /// 対象の本が無い。何も起きていない。
    NotFound,
    /// 本の今の状態ではこの遷移は無い（読了済みを読了にする等）。何も起きていない。
    NotApplicable,
}

/// 確認付きの状態遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    MarkCompleted,
    UndoCompleted,
    Remove,
}

impl Change {
    /// 本の今の状態からこの遷移ができるか。
    /// 読了にできるのは未読の本だけ、未読に戻せるのは読了の本だけ。
    pub fn applies_to(&self, book: &Book) -> bool {
        match self {
            Self::MarkCompleted => !book.is_completed(),
            Self::UndoCompleted => book.is_completed(),
            Self::Remove => true,
        }
    }

    pub fn prompt(&self) -> Prompt {
        match self {
            Self::MarkCompleted => Prompt::are_you_sure("The book will be marked as completed!"),
            Self::UndoCompleted => {
                Prompt::are_you_sure("The book will be marked as not completed!")
            }
            Self::Remove => Prompt::are_you_sure("You will not be able to restore a deleted book!"),
        }
    }

    pub(crate) fn accepted(&self) -> Notice {
        match self {
            Self::MarkCompleted => Notice::success("Book marked as completed!"),
            Self::UndoCompleted => Notice::success("Book moved back to unfinished!"),
            Self::Remove => Notice::success("Book deleted!"),
        }
    }

    pub(crate) fn declined(&self) -> Notice {
        match self {
            Self::MarkCompleted => Notice::info("Book was not marked as completed."),
            Self::UndoCompleted => Notice::info("Book stays marked as completed."),
            Self::Remove => Notice::info("Book was not deleted."),
        }
    }
}
