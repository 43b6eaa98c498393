//! Publish consumer.
//!
//! Drains [`ReadingBatch`]es from the reading channel, encodes one sample
//! per reading and hands it to the [`PublishSink`].  Also owns the hello
//! payload, encoded once at startup since the registry never changes.

use log::{debug, info, warn};

use super::codec;
use super::identity::Identity;
use crate::app::ports::PublishSink;
use crate::error::CodecError;
use crate::poll::{BatchReceiver, ReadingBatch};
use crate::registry::DeviceRegistry;

pub struct Publisher<'r> {
    registry: &'r DeviceRegistry,
    identity: &'r Identity,
    hello: String,
    published: u64,
}

impl<'r> Publisher<'r> {
    pub fn new(registry: &'r DeviceRegistry, identity: &'r Identity) -> Result<Self, CodecError> {
        Ok(Self {
            registry,
            identity,
            hello: codec::hello(identity, registry)?,
            published: 0,
        })
    }

    /// Encoded hello payload.
    pub fn hello(&self) -> &str {
        &self.hello
    }

    /// Samples handed to the sink so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Publish the hello on the edge topic.
    pub fn announce(&self, sink: &mut impl PublishSink) {
        info!("Publish: hello on {}", self.identity.edge_topic());
        sink.publish(self.identity.edge_topic(), &self.hello);
    }

    /// Publish one sample per reading, in batch order.  Returns how many
    /// were handed to the sink.
    pub fn publish_batch(&mut self, batch: &ReadingBatch, sink: &mut impl PublishSink) -> usize {
        let mut sent = 0;
        for reading in &batch.readings {
            let Some(device) = self.registry.get(reading.ordinal) else {
                warn!("Publish: {}", CodecError::UnknownOrdinal(reading.ordinal));
                continue;
            };
            match codec::sample(self.identity, device, reading) {
                Ok(payload) => {
                    debug!("Publish: {} {}", device.topic(), payload);
                    sink.publish(device.topic(), &payload);
                    sent += 1;
                }
                Err(e) => warn!("Publish: {} skipped: {}", device.address(), e),
            }
        }
        self.published += sent as u64;
        sent
    }

    /// Publish every batch already waiting on `rx` without blocking.
    pub fn drain(&mut self, rx: &BatchReceiver<'_>, sink: &mut impl PublishSink) -> usize {
        let mut sent = 0;
        while let Ok(batch) = rx.try_receive() {
            sent += self.publish_batch(&batch, sink);
        }
        sent
    }

    /// Consume batches forever.
    pub async fn run(mut self, rx: BatchReceiver<'_>, sink: &mut impl PublishSink) {
        loop {
            let batch = rx.receive().await;
            self.publish_batch(&batch, sink);
        }
    }
}
