use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::error::StreamResult;
use crate::stream::Stream;

/// A reference-counted handle to one [`Stream`].
///
/// Cloning adds a holder. [`close`](Self::close) gives up one holder, and
/// only the last one actually closes the stream, so concurrent closers can
/// never release the transport twice. The lock covers lifetime and also
/// serializes I/O issued through [`with`](Self::with).
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<Stream>>,
}

impl SharedStream {
    pub fn new(stream: Stream) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// Run `f` with exclusive access to the stream.
    pub fn with<R>(&self, f: impl FnOnce(&mut Stream) -> R) -> R {
        let mut stream = self.inner.lock().expect("shared stream mutex poisoned");
        f(&mut stream)
    }

    /// Number of live holders.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Release this holder. Returns `true` if this was the last holder and
    /// the stream was closed.
    pub fn close(self) -> StreamResult<bool> {
        match Arc::into_inner(self.inner) {
            Some(mutex) => {
                let mut stream = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
                trace!(reference = stream.reference(), "last holder closing shared stream");
                stream.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl From<Stream> for SharedStream {
    fn from(stream: Stream) -> Self {
        Self::new(stream)
    }
}

impl std::fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("holders", &self.holders())
            .finish_non_exhaustive()
    }
}
