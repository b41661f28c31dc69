use crate::domain::model::book::NewBook;
use crate::domain::model::id::BookId;
use crate::domain::model::shelf::{Shelf, ShelfView};
use crate::domain::storage::KeyValueStorage;

use super::confirm::{Change, ChangeOutcome, Confirm};
use super::error::AppError;
use super::events::{SubscriptionId, Trigger};
use super::persistence::ShelfPersistence;

/// 本棚に対するユースケース。
/// mutate → render通知 → save（→ saved通知）の順で操作する。
pub struct ShelfService<S: KeyValueStorage> {
    shelf: Shelf,
    persistence: ShelfPersistence<S>,
    render: Trigger,
    saved: Trigger,
}

impl<S: KeyValueStorage> ShelfService<S> {
    pub fn new(storage: S) -> Self {
        Self {
            shelf: Shelf::new(),
            persistence: ShelfPersistence::new(storage),
            render: Trigger::new(),
            saved: Trigger::new(),
        }
    }

    /// 変更のたびに呼ばれる再描画フック。
    pub fn on_render(&mut self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.render.subscribe(f)
    }

    /// 保存成功のたびに呼ばれるフック。
    pub fn on_saved(&mut self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.saved.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.render.unsubscribe(id) || self.saved.unsubscribe(id)
    }

    /// 保存済みの本棚を読み込んで採用し、初回の描画を通知する。
    /// 保存先が使えない場合は空の本棚のまま続行する。
    pub fn start(&mut self) -> Result<(), AppError> {
        if !self.persistence.is_available() {
            tracing::warn!("storage is not available; the shelf will not be persisted");
            return Ok(());
        }
        let books = self.persistence.load()?;
        self.shelf = Shelf::from_books(books);
        tracing::info!(books = self.shelf.len(), "shelf loaded");
        self.render.fire();
        Ok(())
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn view(&self, query: &str) -> ShelfView<'_> {
        self.shelf.view(query)
    }

    /// 本を追加する。確認は不要。
    pub fn add_book(&mut self, req: NewBook) -> Result<BookId, AppError> {
        let id = self.shelf.add(req);
        tracing::info!(%id, "book added");
        self.commit()?;
        Ok(id)
    }

    /// 未読 → 読了
    pub async fn mark_completed<C: Confirm>(
        &mut self,
        id: BookId,
        confirm: &C,
    ) -> Result<ChangeOutcome, AppError> {
        self.confirm_then_apply(id, Change::MarkCompleted, confirm).await
    }

    /// 読了 → 未読
    pub async fn undo_completed<C: Confirm>(
        &mut self,
        id: BookId,
        confirm: &C,
    ) -> Result<ChangeOutcome, AppError> {
        self.confirm_then_apply(id, Change::UndoCompleted, confirm).await
    }

    /// 本を削除する（終端状態）。
    pub async fn remove_book<C: Confirm>(
        &mut self,
        id: BookId,
        confirm: &C,
    ) -> Result<ChangeOutcome, AppError> {
        self.confirm_then_apply(id, Change::Remove, confirm).await
    }

    // --- private ---

    async fn confirm_then_apply<C: Confirm>(
        &mut self,
        id: BookId,
        change: Change,
        confirm: &C,
    ) -> Result<ChangeOutcome, AppError> {
        let Some(book) = self.shelf.find_by_id(id) else {
            tracing::debug!(%id, ?change, "ignoring change for unknown book");
            return Ok(ChangeOutcome::NotFound);
        };
        if !change.applies_to(book) {
            tracing::debug!(%id, ?change, "change does not apply to the book's state");
            return Ok(ChangeOutcome::NotApplicable);
        }

        if !confirm.confirm(&change.prompt()).await {
            tracing::debug!(%id, ?change, "change declined");
            return Ok(ChangeOutcome::Declined(change.declined()));
        }

        let applied = match change {
            Change::MarkCompleted => self.shelf.set_completed(id, true),
            Change::UndoCompleted => self.shelf.set_completed(id, false),
            Change::Remove => self.shelf.remove(id).is_some(),
        };
        if !applied {
            return Ok(ChangeOutcome::NotFound);
        }
        tracing::info!(%id, ?change, "change applied");
        self.commit()?;
        Ok(ChangeOutcome::Applied(change.accepted()))
    }

    /// 変更後の共通処理: 描画通知 → 保存 → 保存通知。
    /// 保存に失敗してもメモリ上の変更は残る。
    fn commit(&mut self) -> Result<(), AppError> {
        self.render.fire();
        match self.persistence.save(self.shelf.books()) {
            Ok(serialized) => {
                tracing::debug!(value = %serialized, "shelf saved");
                self.saved.fire();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "shelf could not be saved");
                Err(e)
            }
        }
    }
}
