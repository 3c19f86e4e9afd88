//! Shared access to one ballot.
//!
//! Mutations take the write lock, so they run one at a time and each one
//! commits or fails as a whole. Readers share the read lock and always see
//! the last committed state.

use super::events::EventStream;
use super::{Ballot, BallotSnapshot};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct BallotHandle {
    inner: Arc<RwLock<Ballot>>,
}

impl BallotHandle {
    pub fn new(ballot: Ballot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ballot)),
        }
    }

    /// Run a command under the write lock.
    pub async fn execute<T>(&self, command: impl FnOnce(&mut Ballot) -> T) -> T {
        let mut ballot = self.inner.write().await;
        command(&mut ballot)
    }

    /// Run a query under the read lock.
    pub async fn read<T>(&self, query: impl FnOnce(&Ballot) -> T) -> T {
        let ballot = self.inner.read().await;
        query(&ballot)
    }

    pub async fn snapshot(&self) -> BallotSnapshot {
        self.read(Ballot::snapshot).await
    }

    pub async fn subscribe(&self) -> EventStream {
        self.read(Ballot::subscribe).await
    }

    /// Reference that does not keep the ballot, or its push channel, alive.
    pub fn downgrade(&self) -> WeakBallotHandle {
        WeakBallotHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeakBallotHandle {
    inner: Weak<RwLock<Ballot>>,
}

impl WeakBallotHandle {
    /// `None` once every [`BallotHandle`] has been dropped.
    pub fn upgrade(&self) -> Option<BallotHandle> {
        self.inner.upgrade().map(|inner| BallotHandle { inner })
    }
}
