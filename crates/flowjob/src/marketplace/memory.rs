use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::trace;

use super::domain::IdentityId;
use super::store::{Documents, MarketplaceStore, ProfileSnapshot, ProfileSubscription, StoreError};

type ProfileFeeds = HashMap<IdentityId, watch::Sender<Option<ProfileSnapshot>>>;

/// Process-local store used by the API service, the seed command and tests.
///
/// Each transaction runs against a staged copy of the documents that replaces the
/// committed state only when the closure succeeds.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Documents>,
    feeds: Mutex<ProfileFeeds>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_documents(&self) -> Result<std::sync::MutexGuard<'_, Documents>, StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".to_string()))
    }

    fn publish(&self, snapshots: Vec<(IdentityId, Option<ProfileSnapshot>)>) {
        let Ok(mut feeds) = self.feeds.lock() else {
            return;
        };
        for (identity, snapshot) in snapshots {
            if let Some(sender) = feeds.get(&identity) {
                if sender.receiver_count() == 0 {
                    feeds.remove(&identity);
                    continue;
                }
                sender.send_replace(snapshot);
                trace!(%identity, "profile snapshot published");
            }
        }
    }
}

#[async_trait]
impl MarketplaceStore for MemoryStore {
    async fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut Documents) -> Result<T, E> + Send + 'static,
    {
        let mut committed = self.lock_documents()?;
        let mut staged = committed.clone();
        staged.take_touched();

        let value = op(&mut staged)?;
        let touched = staged.take_touched();
        *committed = staged;

        // Published under the documents lock so subscribers observe commits in order.
        let snapshots = touched
            .into_iter()
            .map(|identity| {
                let snapshot = committed.profile_snapshot(&identity);
                (identity, snapshot)
            })
            .collect::<Vec<_>>();
        self.publish(snapshots);
        drop(committed);
        Ok(value)
    }

    async fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&Documents) -> Result<T, E> + Send + 'static,
    {
        let documents = self.lock_documents()?;
        op(&documents)
    }

    fn subscribe_profile(&self, identity: &IdentityId) -> ProfileSubscription {
        // Documents before feeds, the same order `transact` takes them in.
        let documents = self.documents.lock().ok();
        let current = documents
            .as_ref()
            .and_then(|documents| documents.profile_snapshot(identity));

        let receiver = match self.feeds.lock() {
            Ok(mut feeds) => match feeds.get(identity) {
                Some(sender) if sender.receiver_count() > 0 => sender.subscribe(),
                _ => {
                    let (sender, receiver) = watch::channel(current);
                    feeds.insert(identity.clone(), sender);
                    receiver
                }
            },
            Err(_) => watch::channel(current).1,
        };
        drop(documents);

        ProfileSubscription::new(receiver)
    }

    fn live_subscriptions(&self, identity: &IdentityId) -> usize {
        self.feeds
            .lock()
            .ok()
            .and_then(|feeds| feeds.get(identity).map(|sender| sender.receiver_count()))
            .unwrap_or(0)
    }
}
