//! Single-flight cancellable pushes to a remote contents API.

pub mod client;
pub mod queue;

pub use client::{CommitInfo, ContentInfo, ContentRequest, ContentResponse, Destination, RemoteClient};
pub use queue::{PushHandle, PushQueue};
