//! pagedrop - delivery core for captured page artifacts.
//!
//! Two independent concerns:
//!
//! - [`delivery`]: get an arbitrarily large serialized document across a
//!   size-constrained, message-based boundary. A direct fast path offers the
//!   whole payload behind a short-lived transferable reference; on rejection
//!   the same logical payload is re-sent as an ordered chunk stream. Every
//!   task ends with exactly one terminal end message.
//! - [`push`]: write the artifact to a version-controlled remote store, with
//!   at most one write in flight per destination and cooperative
//!   cancellation of the in-flight write.
//!
//! This crate decides *how* bytes cross those boundaries, never *what* bytes
//! to send: serialization of the page itself, filename policy and UI belong
//! to collaborators.

pub mod delivery;
pub mod error;
pub mod push;
pub mod serializer;

pub use delivery::{
    BlobRef, BlobStore, ChannelMessage, ChannelResponse, ChunkedTransport, Delivery,
    DeliveryOptions, DownloadRequest, MessageChannel, TaskId, DEFAULT_FRAME_SIZE,
};
pub use error::{ChannelError, DeliveryError, EncodeError, PushError, PushStatus};
pub use push::{ContentRequest, ContentResponse, Destination, PushHandle, PushQueue, RemoteClient};
pub use serializer::ChunkSequence;
