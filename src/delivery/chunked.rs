//! Chunked transport: bounded frames over the message channel.
//!
//! Splits a payload into an ordered sequence of frames, sends each as a
//! distinct download message and awaits its acknowledgment before the next
//! (backpressure lives in the channel), then closes the task with exactly
//! one terminal end message.

use crate::delivery::message::{
    ChannelMessage, DeliveryOptions, MessageChannel, DEFAULT_FRAME_SIZE,
};
use crate::error::{ChannelError, DeliveryError};
use bytes::Bytes;
use tracing::debug;

pub struct ChunkedTransport {
    frame_size: usize,
}

impl Default for ChunkedTransport {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SIZE)
    }
}

impl ChunkedTransport {
    /// Panics if `frame_size` is zero.
    pub fn new(frame_size: usize) -> Self {
        assert!(frame_size > 0, "frame size must be positive");
        Self { frame_size }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Send `payload` as one task over `channel`.
    ///
    /// Frames are sent in strictly increasing offset order; when the payload
    /// fits in one frame the single message carries it whole. A zero-length
    /// payload still sends one empty-content message, so every task gets at
    /// least one content-bearing message before its end signal.
    ///
    /// A channel failure or an error-bearing acknowledgment aborts the
    /// remaining frames; no partial-task cleanup message is sent.
    pub async fn send(
        &self,
        payload: Bytes,
        options: &DeliveryOptions,
        channel: &dyn MessageChannel,
    ) -> Result<(), DeliveryError> {
        let len = payload.len();
        let truncated = len > self.frame_size;
        let mut offset = 0usize;
        let mut frames = 0u32;

        loop {
            let end = (offset + self.frame_size).min(len);

            let mut request = options.download_request();
            request.truncated = truncated;
            if truncated {
                request.finished = end == len;
                request.content = Some(payload.slice(offset..end));
            } else {
                request.content = Some(payload.clone());
            }

            let response = channel
                .request(ChannelMessage::Download(request))
                .await
                .map_err(DeliveryError::ChannelSend)?;
            if let Some(err) = response.error {
                return Err(DeliveryError::ChannelSend(ChannelError(err.message)));
            }

            frames += 1;
            offset = end;
            if offset >= len {
                break;
            }
        }

        debug!(
            task_id = options.task_id,
            frames, truncated, "payload sent, closing task"
        );

        // Sole exactly-once completion signal for the task.
        let response = channel
            .request(ChannelMessage::End {
                task_id: options.task_id,
            })
            .await
            .map_err(DeliveryError::ChannelSend)?;
        if let Some(err) = response.error {
            return Err(DeliveryError::ChannelSend(ChannelError(err.message)));
        }

        Ok(())
    }
}
