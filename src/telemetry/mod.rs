//! Everything that turns registry entries and readings into published
//! messages: topic naming, device identity, JSON payloads and the publish
//! consumer.

pub mod codec;
pub mod identity;
pub mod publisher;
pub mod topic;

pub use identity::Identity;
pub use publisher::Publisher;
