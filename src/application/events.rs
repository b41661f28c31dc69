//! ペイロード無しの変更通知。
//!
//! 購読者は登録順に同期的に呼ばれる。キューもバックプレッシャーも無い。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 購読解除に使うハンドル。全Triggerを通して一意。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

type Callback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct Trigger {
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// 購読を解除する。既に解除済みなら false。
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn fire(&self) {
        for (_, callback) in &self.subscribers {
            callback();
        }
    }
}
