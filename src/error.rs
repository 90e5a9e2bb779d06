//! Error taxonomy for delivery and push operations.
//!
//! Only the fast-path rejection is recovered internally (by falling back to
//! the chunked stream); every other kind propagates to the immediate caller.
//! There is no cross-task retry anywhere in this crate.

use thiserror::Error;

/// A message could not be delivered or acknowledged by the channel.
///
/// Fatal to the current task. The caller decides whether to restart the
/// whole delivery; this crate never retries.
#[derive(Debug, Clone, Error)]
#[error("channel send failed: {0}")]
pub struct ChannelError(pub String);

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Serializing a document or envelope to transport bytes failed.
#[derive(Debug, Error)]
#[error("encoding failed: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// Failure of a delivery task.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A frame or the terminal message failed to send on the primary
    /// chunked path. No partial-task cleanup message is sent.
    #[error("chunk send failed: {0}")]
    ChannelSend(#[source] ChannelError),

    /// A chunk in the fallback stream failed to send. The task is left
    /// without its terminal end message.
    #[error("fallback stream failed: {0}")]
    FallbackStream(#[source] ChannelError),

    /// The document could not be serialized for transport.
    #[error(transparent)]
    Encoding(#[from] EncodeError),
}

/// Failure of a remote push.
#[derive(Debug, Error)]
pub enum PushError {
    /// The remote store answered with status >= 400; carries the
    /// server-provided message verbatim.
    #[error("remote rejected write ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// Transport-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The write observed a cancellation request. The queue swallows this
    /// variant into [`PushStatus::Aborted`]; it never reaches a
    /// [`PushHandle::join`](crate::push::PushHandle::join) caller as an error.
    #[error("push aborted by caller")]
    Aborted,

    /// The push task terminated without settling (runtime shut down).
    #[error("push task terminated before settling")]
    Terminated,
}

/// Settled outcome of a push, as observed through its handle.
#[derive(Debug)]
pub enum PushStatus {
    /// The remote write succeeded; carries the parsed response body.
    Completed(crate::push::ContentResponse),
    /// The write was cancelled by the caller. A normal outcome, not an error.
    Aborted,
}

impl PushStatus {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}
