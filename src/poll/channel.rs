//! Hand-off between the poll loop and the publisher.
//!
//! ```text
//! ┌──────────────┐ ReadingBatch ┌──────────────┐
//! │  Poll loop   │─────────────▶│  Publisher   │
//! │  (thread)    │  depth = 4   │  (async)     │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! The producer never blocks: when the publisher falls behind and the
//! channel is full, the newest batch is dropped and counted.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use super::ReadingBatch;

/// Batches buffered between the two sides.
pub const BATCH_DEPTH: usize = 4;

pub type ReadingChannel = Channel<CriticalSectionRawMutex, ReadingBatch, BATCH_DEPTH>;
pub type BatchSender<'a> = Sender<'a, CriticalSectionRawMutex, ReadingBatch, BATCH_DEPTH>;
pub type BatchReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, ReadingBatch, BATCH_DEPTH>;

/// Process-wide reading channel used by the firmware binary.
pub static READINGS: ReadingChannel = Channel::new();
