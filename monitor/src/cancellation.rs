use tokio::sync::watch;

/// A token that can be checked for cancellation.
#[derive(Clone)]
pub struct CancellationToken(watch::Receiver<bool>);

impl CancellationToken {
    /// Returns true if cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Owning side of a cancellation pair. Dropping it cancels every token.
pub struct CancellationHandle(watch::Sender<bool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        // Receivers may already be gone once workers finish
        let _ = self.0.send(true);
    }
}

impl Drop for CancellationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn channel() -> (CancellationHandle, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle(tx), CancellationToken(rx))
}
