//! Live notification feed for external watchers.
//!
//! Wraps a tokio broadcast receiver. Entries arrive in journal order because
//! the ledger sends them from inside its critical section.

use crate::errors::StreamError;
use crate::journal::JournalEntry;
use tokio::sync::broadcast;

/// Subscriber handle returned by [`crate::Ledger::subscribe`]
#[derive(Debug)]
pub struct NotificationStream {
    receiver: broadcast::Receiver<JournalEntry>,
}

impl NotificationStream {
    pub(crate) fn new(receiver: broadcast::Receiver<JournalEntry>) -> Self {
        Self { receiver }
    }

    /// Wait for the next accepted entry.
    ///
    /// # Errors
    ///
    /// [`StreamError::Lagged`] if entries were dropped because this subscriber
    /// fell behind; the next call resumes with the oldest retained entry.
    /// [`StreamError::Closed`] once the ledger is gone and the buffer is drained.
    pub async fn recv(&mut self) -> Result<JournalEntry, StreamError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(n) => StreamError::Lagged(n),
            broadcast::error::RecvError::Closed => StreamError::Closed,
        })
    }

    /// Take the next buffered entry without waiting.
    ///
    /// # Errors
    ///
    /// Same as [`NotificationStream::recv`].
    pub fn try_recv(&mut self) -> Result<Option<JournalEntry>, StreamError> {
        use tokio::sync::broadcast::error::TryRecvError;
        match self.receiver.try_recv() {
            Ok(entry) => Ok(Some(entry)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Lagged(n)) => Err(StreamError::Lagged(n)),
            Err(TryRecvError::Closed) => Err(StreamError::Closed),
        }
    }

    /// Drain everything currently buffered
    ///
    /// # Errors
    ///
    /// [`StreamError::Lagged`] as for [`NotificationStream::try_recv`]. A closed
    /// stream ends the drain normally.
    pub fn drain(&mut self) -> Result<Vec<JournalEntry>, StreamError> {
        let mut out = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(entry)) => out.push(entry),
                Ok(None) | Err(StreamError::Closed) => return Ok(out),
                Err(lagged) => return Err(lagged),
            }
        }
    }
}
