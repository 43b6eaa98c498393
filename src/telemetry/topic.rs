//! Topic naming.
//!
//! - samples: `<root>/sensor/<address>`
//! - hello:   `<root>/edge`
//!
//! An empty root is a hard error rather than producing `/sensor/...`.

use crate::error::TopicError;
use crate::onewire::Address;
use crate::onewire::rom::ADDRESS_LEN;

/// Longest topic this firmware will build.
pub const TOPIC_CAPACITY: usize = 96;

pub type Topic = heapless::String<TOPIC_CAPACITY>;

pub const SENSOR_SEGMENT: &str = "sensor";
pub const EDGE_SEGMENT: &str = "edge";

/// Longest root that still leaves room for `/sensor/<address>`.
pub const MAX_ROOT_LEN: usize = TOPIC_CAPACITY - SENSOR_SEGMENT.len() - ADDRESS_LEN - 2;

/// Reject roots that cannot prefix a publishable topic.
pub fn validate_root(root: &str) -> Result<(), TopicError> {
    if root.is_empty() {
        return Err(TopicError::EmptyRoot);
    }
    if root.contains(['+', '#', '\0']) {
        return Err(TopicError::InvalidRoot);
    }
    if root.len() > MAX_ROOT_LEN {
        return Err(TopicError::TooLong);
    }
    Ok(())
}

/// `root + "/" + kind + "/" + leaf`.
pub fn topic(root: &str, kind: &str, leaf: &str) -> Result<Topic, TopicError> {
    join(root, &[kind, leaf])
}

pub fn sensor_topic(root: &str, address: &Address) -> Result<Topic, TopicError> {
    topic(root, SENSOR_SEGMENT, address.as_str())
}

pub fn edge_topic(root: &str) -> Result<Topic, TopicError> {
    join(root, &[EDGE_SEGMENT])
}

fn join(root: &str, segments: &[&str]) -> Result<Topic, TopicError> {
    validate_root(root)?;
    let mut out = Topic::new();
    out.push_str(root).map_err(|()| TopicError::TooLong)?;
    for segment in segments {
        out.push('/').map_err(|()| TopicError::TooLong)?;
        out.push_str(segment).map_err(|()| TopicError::TooLong)?;
    }
    Ok(out)
}
