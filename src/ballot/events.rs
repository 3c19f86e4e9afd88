//! Ordered, replayable notification log.
//!
//! Every committed command appends exactly the notifications it produced.
//! Observers either poll with [`EventLog::since`] from the last sequence they
//! saw, or subscribe to the push stream returned by [`EventLog::subscribe`].
//! The log survives resets; each record names the lifecycle it belongs to.

use super::types::{BallotId, Identity, ProposalId};
use super::workflow::WorkflowStatus;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Default capacity of the push channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Notifications emitted by the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BallotEvent {
    VoterRegistered {
        voter: Identity,
    },
    VoterUnregistered {
        voter: Identity,
    },
    ProposalRegistered {
        proposal_id: ProposalId,
        description: String,
    },
    Voted {
        voter: Identity,
        proposal_id: ProposalId,
    },
    WorkflowStatusChange {
        previous: WorkflowStatus,
        new: WorkflowStatus,
    },
    /// Tally found several leaders; arbitration is required.
    Draw {
        tied: BTreeSet<ProposalId>,
    },
    AdministratorTransferred {
        previous: Identity,
        new: Identity,
    },
    QuestionSet {
        question: String,
    },
}

impl BallotEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BallotEvent::VoterRegistered { .. } => "VoterRegistered",
            BallotEvent::VoterUnregistered { .. } => "VoterUnregistered",
            BallotEvent::ProposalRegistered { .. } => "ProposalRegistered",
            BallotEvent::Voted { .. } => "Voted",
            BallotEvent::WorkflowStatusChange { .. } => "WorkflowStatusChange",
            BallotEvent::Draw { .. } => "Draw",
            BallotEvent::AdministratorTransferred { .. } => "AdministratorTransferred",
            BallotEvent::QuestionSet { .. } => "QuestionSet",
        }
    }
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, from 0, without gaps.
    pub sequence: u64,
    /// Lifecycle the event belongs to.
    pub ballot: BallotId,
    pub event: BallotEvent,
}

#[derive(Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    sender: broadcast::Sender<EventRecord>,
    capacity: usize,
}

impl EventLog {
    /// Create an empty log whose push channel buffers `capacity` records per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            records: Vec::new(),
            sender,
            capacity,
        }
    }

    /// Append and broadcast. Returns the sequence number assigned.
    pub fn append(&mut self, ballot: BallotId, event: BallotEvent) -> u64 {
        let sequence = self.records.len() as u64;
        let record = EventRecord {
            sequence,
            ballot,
            event,
        };

        // No subscribers is fine; the record stays pollable.
        let _ = self.sender.send(record.clone());
        self.records.push(record);
        sequence
    }

    /// Records with `sequence >= offset`, in order.
    pub fn since(&self, offset: u64) -> &[EventRecord] {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence the next record will get.
    pub fn next_sequence(&self) -> u64 {
        self.records.len() as u64
    }

    /// Push stream of records appended from now on.
    ///
    /// Ends when the log is dropped.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.sender.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Clone for EventLog {
    /// Copies the records. The copy gets its own push channel with the same
    /// capacity; subscribers of the source log do not see the copy's appends.
    fn clone(&self) -> Self {
        let mut log = Self::new(self.capacity);
        log.records = self.records.clone();
        log
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventStreamError {
    /// The subscriber fell behind and `n` records were dropped from its buffer.
    /// They can still be read with [`EventLog::since`].
    #[error("subscriber lagged behind by {0} records")]
    Lagged(u64),
}

/// Push subscription to an [`EventLog`].
pub struct EventStream {
    inner: BroadcastStream<EventRecord>,
}

impl Stream for EventStream {
    type Item = Result<EventRecord, EventStreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|item| {
            item.map(|result| {
                result.map_err(|err| match err {
                    BroadcastStreamRecvError::Lagged(n) => EventStreamError::Lagged(n),
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn registered(key: &str) -> BallotEvent {
        BallotEvent::VoterRegistered {
            voter: Identity::from(key),
        }
    }

    #[test]
    fn test_sequences_are_dense() {
        let ballot = BallotId::generate();
        let mut log = EventLog::default();

        assert_eq!(log.append(ballot, registered("a")), 0);
        assert_eq!(log.append(ballot, registered("b")), 1);
        assert_eq!(log.next_sequence(), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_since_offset() {
        let ballot = BallotId::generate();
        let mut log = EventLog::default();
        for key in ["a", "b", "c"] {
            log.append(ballot, registered(key));
        }

        let tail = log.since(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 1);
        assert_eq!(tail[1].event, registered("c"));

        assert!(log.since(3).is_empty());
        assert!(log.since(u64::MAX).is_empty());
        assert_eq!(log.since(0).len(), 3);
    }

    #[test]
    fn test_clone_keeps_records() {
        let ballot = BallotId::generate();
        let mut log = EventLog::default();
        log.append(ballot, registered("a"));

        let copy = log.clone();
        assert_eq!(copy.records(), log.records());
        assert_eq!(copy.subscriber_count(), 0);
    }

    #[test]
    fn test_event_json_shape() {
        let event = BallotEvent::WorkflowStatusChange {
            previous: WorkflowStatus::RegisteringVoters,
            new: WorkflowStatus::ProposalsRegistrationStarted,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "WorkflowStatusChange");
        assert_eq!(json["previous"], "RegisteringVoters");
        assert_eq!(json["new"], "ProposalsRegistrationStarted");
        assert_eq!(event.name(), "WorkflowStatusChange");
    }

    #[tokio::test]
    async fn test_subscriber_receives_appends() {
        let ballot = BallotId::generate();
        let mut log = EventLog::new(8);
        let mut stream = log.subscribe();

        log.append(ballot, registered("a"));
        log.append(ballot, registered("b"));
        drop(log);

        let received: Vec<_> = stream.by_ref().collect().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].as_ref().unwrap().sequence, 0);
        assert_eq!(received[1].as_ref().unwrap().event, registered("b"));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let ballot = BallotId::generate();
        let mut log = EventLog::new(2);
        let mut stream = log.subscribe();

        for key in ["a", "b", "c", "d"] {
            log.append(ballot, registered(key));
        }

        let first = stream.next().await.unwrap();
        assert_eq!(first, Err(EventStreamError::Lagged(2)));

        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next.sequence, 2);
        assert_eq!(log.since(0).len(), 4);
    }
}
