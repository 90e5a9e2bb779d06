//! Content-to-background delivery of captured artifacts.
//!
//! Two paths over one abstract channel:
//!
//! ```text
//! caller -> serializer -> +-----------------------+     +------------+
//!                         | direct fast path      | --> |            |
//!                         | (transferable blob)   |     |  channel   |
//!                         +-----------------------+     | (send +    |
//!                         | chunked transport /   | --> |  await ack)|
//!                         | fallback chunk stream |     |            |
//!                         +-----------------------+     +------------+
//! ```
//!
//! Every task is closed by exactly one terminal end message, always last.

pub mod blob;
pub mod chunked;
pub mod message;
pub mod pipeline;

pub use blob::{BlobRef, BlobStore};
pub use chunked::ChunkedTransport;
pub use message::{
    ChannelMessage, ChannelResponse, DeliveryOptions, DownloadRequest, MessageChannel,
    ResponseError, TaskId, DEFAULT_FRAME_SIZE,
};
pub use pipeline::Delivery;
