//! Message types for the capture delivery channel.
//!
//! The channel is an abstract request/response boundary: send one message,
//! await its acknowledgment. Messages for one task are ordered and reliable;
//! cross-task ordering is not a concern handled here.

use crate::delivery::blob::BlobRef;
use crate::error::ChannelError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Correlation id for one delivery task.
pub type TaskId = u64;

/// Default maximum frame size for chunked transfer.
pub const DEFAULT_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// A message crossing the delivery channel.
#[derive(Debug, Clone)]
pub enum ChannelMessage {
    /// Primary payload, chunk frame, fallback data chunk, or the contentless
    /// end-of-stream sentinel, depending on which fields are set.
    Download(DownloadRequest),

    /// Terminal completion signal for a task. Sent exactly once per task,
    /// always last; receivers must not infer completion from frame flags.
    End { task_id: TaskId },
}

impl ChannelMessage {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Download(req) => req.task_id,
            Self::End { task_id } => *task_id,
        }
    }
}

/// A download message. Option fields are forwarded verbatim on every frame;
/// this crate interprets none of them beyond `task_id` and `background_save`.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub task_id: TaskId,

    /// Suggested output filename, passed through uninterpreted.
    pub filename: String,

    /// Whether the collaborator prepended a byte-order mark. Forwarded only.
    pub include_bom: bool,

    /// Whether the receiving side persists the artifact itself, in which
    /// case the sender still owns the terminal end signal.
    pub background_save: bool,

    /// Transferable reference to the full payload (fast path only).
    pub blob: Option<BlobRef>,

    /// Frame bytes (chunked transport path).
    pub content: Option<Bytes>,

    /// Re-serialized envelope chunk (fallback path). A download message with
    /// neither `content`, `data` nor `blob` is the fallback stream sentinel.
    pub data: Option<Bytes>,

    /// True iff the payload did not fit in a single frame.
    pub truncated: bool,

    /// True on the last frame of a truncated payload; meaningless otherwise.
    pub finished: bool,

    /// Opaque pass-through fields (conflict policy, destination selection,
    /// credentials...) forwarded without interpretation.
    pub extra: Map<String, Value>,
}

impl DownloadRequest {
    /// True when this message carries no payload at all - the sentinel that
    /// marks the end of a fallback chunk stream.
    pub fn is_sentinel(&self) -> bool {
        self.blob.is_none() && self.content.is_none() && self.data.is_none()
    }
}

/// Structured acknowledgment for a channel message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelResponse {
    /// Absent (or empty message) signals success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ChannelResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: Some(ResponseError {
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// Caller-level options for one delivery task. Everything except `task_id`
/// and `background_save` is forwarded verbatim.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryOptions {
    pub task_id: TaskId,
    pub filename: String,
    pub include_bom: bool,
    pub background_save: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeliveryOptions {
    /// A download message pre-populated with this task's metadata and no
    /// payload fields set.
    pub fn download_request(&self) -> DownloadRequest {
        DownloadRequest {
            task_id: self.task_id,
            filename: self.filename.clone(),
            include_bom: self.include_bom,
            background_save: self.background_save,
            extra: self.extra.clone(),
            ..Default::default()
        }
    }
}

/// Abstract send-and-await-acknowledgment channel.
///
/// The channel, not its callers, may delay acknowledgment; senders never
/// issue message N+1 before message N's request completes.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn request(&self, message: ChannelMessage) -> Result<ChannelResponse, ChannelError>;
}
