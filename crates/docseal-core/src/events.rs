//! # Account-Change Notifications
//!
//! Ledger handles act on behalf of one account at a time. When the account
//! changes, subscribers (UI sessions, cached profile lookups) must be told.
//! [`AccountEvents`] is a small handler registry. Subscribing returns a
//! [`Subscription`] guard, and the handler stays registered until the guard is
//! dropped or [`Subscription::unsubscribe`] is called.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::identity::Address;

/// Callback invoked with the new account address.
pub type AccountHandler = Box<dyn Fn(&Address) + Send + Sync>;

type Handlers = Mutex<BTreeMap<u64, Arc<AccountHandler>>>;

/// Registry of account-change handlers.
#[derive(Default)]
pub struct AccountEvents {
    handlers: Arc<Handlers>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for AccountEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl AccountEvents {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It is removed when the returned guard is dropped.
    pub fn subscribe(&self, handler: AccountHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().insert(id, Arc::new(handler));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Notify every registered handler, in subscription order.
    ///
    /// Handlers run outside the registry lock, so a handler may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, account: &Address) {
        let snapshot: Vec<Arc<AccountHandler>> = self.handlers.lock().values().cloned().collect();
        tracing::debug!(account = %account, subscribers = snapshot.len(), "account changed");
        for handler in snapshot {
            handler(account);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

/// Guard for a registered account-change handler.
#[must_use = "dropping a Subscription unsubscribes its handler"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    handlers: Weak<Handlers>,
}

impl Subscription {
    /// Remove the handler now.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.upgrade() {
            handlers.lock().remove(&self.id);
        }
    }
}
