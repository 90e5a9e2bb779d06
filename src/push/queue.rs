//! Single-flight push queue.
//!
//! At most one remote write is in flight per destination scope. A push
//! issued while another is in flight waits for it to settle, then runs;
//! writes to one scope execute one at a time in call order. The in-flight
//! write is cancellable, and cancellation is a normal outcome, not an error.

use crate::error::{PushError, PushStatus};
use crate::push::client::{ContentRequest, Destination, RemoteClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The scope's single in-flight write.
#[derive(Debug)]
struct PendingPush {
    token: CancellationToken,
    path: String,
}

/// Tail of a scope's FIFO chain: the settle signal of the most recently
/// queued push, and that push's position number.
#[derive(Default)]
struct ChainTail {
    rx: Option<oneshot::Receiver<()>>,
    seq: u64,
}

/// Per-scope state: the FIFO chain tail and the single pending slot.
#[derive(Default)]
struct ScopeState {
    tail: Mutex<ChainTail>,
    pending: Mutex<Option<PendingPush>>,
}

/// Clears the pending slot when the write settles, on every exit path.
struct SlotGuard<'a>(&'a Mutex<Option<PendingPush>>);

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().expect("pending slot poisoned").take();
    }
}

/// Handle joining the caller to a pending push.
pub struct PushHandle {
    token: CancellationToken,
    completion: oneshot::Receiver<Result<PushStatus, PushError>>,
}

impl PushHandle {
    /// Request cancellation of the write. Cooperative: the write observes
    /// the signal at its network-call boundary and settles as
    /// [`PushStatus::Aborted`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Await the push's settled outcome.
    pub async fn join(self) -> Result<PushStatus, PushError> {
        self.completion
            .await
            .unwrap_or(Err(PushError::Terminated))
    }
}

#[derive(Default)]
pub struct PushQueue {
    client: RemoteClient,
    scopes: Arc<Mutex<HashMap<String, Arc<ScopeState>>>>,
}

impl PushQueue {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            scopes: Arc::default(),
        }
    }

    /// Queue a write of `request` to `path` in `dest`.
    ///
    /// Returns immediately with a handle. The scope's queue position is
    /// taken synchronously before this method returns, so writes to one
    /// scope start in call order, each only after every earlier push to
    /// that scope has settled. Independent destinations get independent
    /// slots and never serialize against each other.
    pub fn push(&self, dest: Destination, path: String, request: ContentRequest) -> PushHandle {
        let token = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();
        let (settled_tx, settled_rx) = oneshot::channel();

        let scope_key = dest.scope_key();
        let (scope, predecessor, seq) = {
            let mut scopes = self.scopes.lock().expect("scope map poisoned");
            let scope = Arc::clone(scopes.entry(scope_key.clone()).or_default());
            let mut tail = scope.tail.lock().expect("chain tail poisoned");
            tail.seq += 1;
            let seq = tail.seq;
            let predecessor = tail.rx.replace(settled_rx);
            drop(tail);
            (scope, predecessor, seq)
        };

        let client = self.client.clone();
        let scopes = Arc::clone(&self.scopes);
        let task_token = token.clone();
        tokio::spawn(async move {
            // FIFO: wait for the previous push to this scope to settle.
            // A receive error means the predecessor task was torn down;
            // the slot is free either way.
            if let Some(prev) = predecessor {
                let _ = prev.await;
            }

            *scope.pending.lock().expect("pending slot poisoned") = Some(PendingPush {
                token: task_token.clone(),
                path: path.clone(),
            });
            let slot = SlotGuard(&scope.pending);

            let result = client
                .put_content(&dest, &path, &request, &task_token)
                .await;
            // Clear the slot before signaling completion, so a joined
            // caller observes the scope idle.
            drop(slot);

            // Drop the scope entry unless a later push already queued
            // behind this one.
            {
                let mut map = scopes.lock().expect("scope map poisoned");
                let mut tail = scope.tail.lock().expect("chain tail poisoned");
                if tail.seq == seq {
                    tail.rx = None;
                    drop(tail);
                    map.remove(&scope_key);
                }
            }
            let _ = settled_tx.send(());

            let outcome = match result {
                Ok(response) => Ok(PushStatus::Completed(response)),
                // Cancellation is a caller-requested normal outcome.
                Err(PushError::Aborted) => {
                    debug!(path = %path, "push aborted");
                    Ok(PushStatus::Aborted)
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "push failed");
                    Err(err)
                }
            };
            // The caller may have dropped its handle without joining.
            let _ = done_tx.send(outcome);
        });

        PushHandle {
            token,
            completion: done_rx,
        }
    }

    /// Cancel the scope's in-flight write, if any. Returns whether a write
    /// was pending.
    pub fn cancel_pending(&self, dest: &Destination) -> bool {
        let scope = match self.existing_scope(dest) {
            Some(scope) => scope,
            None => return false,
        };
        let pending = scope.pending.lock().expect("pending slot poisoned");
        match pending.as_ref() {
            Some(push) => {
                push.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Path targeted by the scope's in-flight write, if any.
    pub fn pending_path(&self, dest: &Destination) -> Option<String> {
        let scope = self.existing_scope(dest)?;
        let pending = scope.pending.lock().expect("pending slot poisoned");
        pending.as_ref().map(|push| push.path.clone())
    }

    /// Read-only lookup; never allocates a scope entry.
    fn existing_scope(&self, dest: &Destination) -> Option<Arc<ScopeState>> {
        let scopes = self.scopes.lock().expect("scope map poisoned");
        scopes.get(&dest.scope_key()).map(Arc::clone)
    }

    #[cfg(test)]
    fn scope_count(&self) -> usize {
        self.scopes.lock().expect("scope map poisoned").len()
    }
}
