//! Channel-based delivery of card event batches
//!
//! The monitor delivers each status change as one batch. The watcher relies
//! on batch boundaries to process insertions before removals.

use crate::event::CardEvent;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// One batch of card events, as observed in a single status change
pub type EventBatch = Vec<CardEvent>;

/// Sender for card event batches
pub type BatchSender = Sender<EventBatch>;
/// Receiver for card event batches
pub type BatchReceiver = Receiver<EventBatch>;

/// Create an unbounded channel for card event batches
pub fn batch_channel() -> (BatchSender, BatchReceiver) {
    unbounded()
}
