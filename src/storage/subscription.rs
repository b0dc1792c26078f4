use std::marker::PhantomData;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::errors::Result;
use crate::storage::{decode_all, Collection, Document};

/// Sequence of full-collection snapshots for one document type.
///
/// Iteration blocks until the next change and ends once the store is gone.
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// cancels delivery.
pub struct Subscription<T> {
    receiver: Receiver<Collection>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Subscription<T> {
    pub(crate) fn new(receiver: Receiver<Collection>) -> Self {
        Self {
            receiver,
            _marker: PhantomData,
        }
    }

    /// Returns a pending snapshot without blocking, if one is queued.
    pub fn try_next(&mut self) -> Option<Result<Vec<T>>> {
        match self.receiver.try_recv() {
            Ok(documents) => Some(decode_all(documents)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every queued snapshot and returns only the newest one.
    pub fn latest(&mut self) -> Option<Result<Vec<T>>> {
        let mut newest = None;
        while let Ok(documents) = self.receiver.try_recv() {
            newest = Some(documents);
        }
        newest.map(decode_all)
    }

    pub fn unsubscribe(self) {}
}

impl<T: Document> Iterator for Subscription<T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok().map(decode_all)
    }
}
