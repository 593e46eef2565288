//! Parsing on a worker thread.
//!
//! A [`ParseTask`] owns its input and runs the whole import, decode of the
//! container included, on a dedicated thread. The caller either polls
//! without blocking or joins. Errors from the worker come back unchanged and
//! a panic on the worker becomes [`Error::Worker`].

use std::{
    any::Any,
    thread::{self, JoinHandle},
};

use tracing::debug;

use crate::{
    document::Document,
    error::{Error, Result},
    options::ReadOptions,
};

/// Handle to a document being parsed in the background.
#[derive(Debug)]
pub struct ParseTask {
    handle: Option<JoinHandle<Result<Document>>>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_owned())
}

impl ParseTask {
    fn spawn_with<F>(work: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Document> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("glbkit-parse".to_owned())
            .spawn(work)?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Parses JSON text in the background. `bin` is bound to buffer 0 as in
    /// [`Document::from_json`].
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the thread cannot be started.
    pub fn spawn(json: String, options: ReadOptions, bin: Option<Vec<u8>>) -> Result<Self> {
        debug!(len = json.len(), "spawning json parse");
        Self::spawn_with(move || Document::from_json(&json, &options, bin.as_deref()))
    }

    /// Reads a container in the background.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the thread cannot be started.
    pub fn spawn_glb(bytes: Vec<u8>, options: ReadOptions) -> Result<Self> {
        debug!(len = bytes.len(), "spawning container parse");
        Self::spawn_with(move || Document::from_glb(&bytes, &options))
    }

    /// Whether the worker is done. Also true once the result has been taken.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// The result if the worker is done, without blocking. The result is
    /// handed out once; later calls return `None`.
    pub fn poll(&mut self) -> Option<Result<Document>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        self.handle.take().map(Self::finish)
    }

    /// Blocks until the worker is done.
    ///
    /// # Errors
    ///
    /// The worker's error, [`Error::Worker`] if it panicked or if the result
    /// was already taken by [`ParseTask::poll`].
    pub fn join(mut self) -> Result<Document> {
        match self.handle.take() {
            Some(handle) => Self::finish(handle),
            None => Err(Error::Worker("result already taken".to_owned())),
        }
    }

    fn finish(handle: JoinHandle<Result<Document>>) -> Result<Document> {
        handle
            .join()
            .map_err(|payload| Error::Worker(panic_message(payload.as_ref())))?
    }
}
