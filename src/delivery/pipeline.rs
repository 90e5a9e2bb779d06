//! Direct-then-fallback delivery.
//!
//! The fast path offers the whole payload at once behind a short-lived
//! transferable reference - cheap when the receiver can dereference it
//! directly. If the receiver rejects that exchange, the same logical payload
//! is re-sent as a chunked stream of the re-serialized message envelope:
//! degraded but reliable. Either way the receiver reconstructs an identical
//! document.

use crate::delivery::blob::BlobStore;
use crate::delivery::message::{
    ChannelMessage, DeliveryOptions, MessageChannel, DEFAULT_FRAME_SIZE,
};
use crate::error::{ChannelError, DeliveryError};
use crate::serializer;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// The message envelope re-serialized for the fallback stream: the task's
/// options plus the document, with the blob reference field cleared.
#[derive(Serialize)]
struct FallbackEnvelope<'a, T: Serialize> {
    task_id: u64,
    filename: &'a str,
    include_bom: bool,
    background_save: bool,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
    document: &'a T,
}

pub struct Delivery {
    blobs: Arc<BlobStore>,
    chunk_size: usize,
}

impl Default for Delivery {
    fn default() -> Self {
        Self::new(Arc::new(BlobStore::new()), DEFAULT_FRAME_SIZE)
    }
}

impl Delivery {
    /// Panics if `chunk_size` is zero.
    pub fn new(blobs: Arc<BlobStore>, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self { blobs, chunk_size }
    }

    /// Store shared with receivers so they can dereference fast-path blobs.
    pub fn blob_store(&self) -> Arc<BlobStore> {
        Arc::clone(&self.blobs)
    }

    /// Deliver `document` over `channel`, fast path first.
    ///
    /// Fails only if the fast path's message could not be sent at all, the
    /// document could not be serialized, or the fallback stream itself
    /// failed. A fast-path rejection alone is recovered by the fallback and
    /// never surfaces.
    pub async fn deliver<T: Serialize>(
        &self,
        document: &T,
        options: &DeliveryOptions,
        channel: &dyn MessageChannel,
    ) -> Result<(), DeliveryError> {
        let payload = serializer::to_bytes(document)?;

        let blob = self.blobs.insert(payload);
        let mut request = options.download_request();
        request.blob = Some(blob.clone());

        let exchange = channel.request(ChannelMessage::Download(request)).await;
        // The reference is valid for one exchange only.
        self.blobs.revoke(&blob);

        let response = exchange.map_err(DeliveryError::ChannelSend)?;
        match response.error {
            None => {
                if options.background_save {
                    let response = channel
                        .request(ChannelMessage::End {
                            task_id: options.task_id,
                        })
                        .await
                        .map_err(DeliveryError::ChannelSend)?;
                    if let Some(err) = response.error {
                        return Err(DeliveryError::ChannelSend(ChannelError(err.message)));
                    }
                }
                Ok(())
            }
            Some(err) => {
                debug!(
                    task_id = options.task_id,
                    reason = %err.message,
                    "fast path rejected, streaming fallback"
                );
                self.stream_fallback(document, options, channel).await
            }
        }
    }

    /// Re-serialize the envelope and send it chunk by chunk, then the
    /// contentless sentinel, then the terminal end message.
    ///
    /// A failure mid-stream leaves the task without its end message; that is
    /// fatal and surfaced to the caller, with no internal retry.
    async fn stream_fallback<T: Serialize>(
        &self,
        document: &T,
        options: &DeliveryOptions,
        channel: &dyn MessageChannel,
    ) -> Result<(), DeliveryError> {
        let envelope = FallbackEnvelope {
            task_id: options.task_id,
            filename: &options.filename,
            include_bom: options.include_bom,
            background_save: options.background_save,
            extra: &options.extra,
            document,
        };
        // Finite, non-restartable; consumed exactly once per attempt.
        let chunks = serializer::to_chunks(&envelope, self.chunk_size)?;

        let mut sent = 0u32;
        for chunk in chunks {
            let mut request = options.download_request();
            request.data = Some(chunk);
            Self::fallback_send(channel, ChannelMessage::Download(request)).await?;
            sent += 1;
        }

        // Contentless sentinel: the serialized envelope is complete.
        Self::fallback_send(
            channel,
            ChannelMessage::Download(options.download_request()),
        )
        .await?;

        Self::fallback_send(
            channel,
            ChannelMessage::End {
                task_id: options.task_id,
            },
        )
        .await?;

        debug!(task_id = options.task_id, chunks = sent, "fallback stream complete");
        Ok(())
    }

    async fn fallback_send(
        channel: &dyn MessageChannel,
        message: ChannelMessage,
    ) -> Result<(), DeliveryError> {
        let response = channel
            .request(message)
            .await
            .map_err(DeliveryError::FallbackStream)?;
        if let Some(err) = response.error {
            return Err(DeliveryError::FallbackStream(ChannelError(err.message)));
        }
        Ok(())
    }
}
