//! Release tracking for resources handed out by a data source.
//!
//! A [`ResourceRegistry`] owns a list of release callbacks. Closing the
//! registry runs every callback in registration order, once; closing again is
//! a no-op. Streams handed out through the tracked accessors of
//! [`DataSource`](super::DataSource) register themselves here, so closing the
//! data source releases them even if the caller never does.

use encoding_rs::Encoding;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

type ReleaseFn = Box<dyn FnOnce() -> io::Result<()> + Send>;

#[derive(Default)]
struct RegistryState {
    releases: Vec<ReleaseFn>,
    closed: bool,
}

/// Ordered list of release callbacks with idempotent close.
#[derive(Default)]
pub struct ResourceRegistry {
    state: Mutex<RegistryState>,
}

impl ResourceRegistry {
    /// Creates an empty, open registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a release callback.
    ///
    /// Returns `false` if the registry is already closed; the callback is then
    /// run immediately so the resource is not leaked.
    pub fn register<F>(&self, release: F) -> bool
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            if let Err(e) = release() {
                warn!("Failed to release resource registered after close: {}", e);
            }
            return false;
        }
        state.releases.push(Box::new(release));
        true
    }

    /// Number of callbacks waiting for close.
    pub fn pending(&self) -> usize {
        self.lock().releases.len()
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Runs every callback in registration order.
    ///
    /// All callbacks run even if some fail; the first failure is returned.
    pub fn close(&self) -> io::Result<()> {
        let releases = {
            let mut state = self.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            std::mem::take(&mut state.releases)
        };

        let mut first_error = None;
        for release in releases {
            if let Err(e) = release() {
                warn!("Failed to release resource: {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ResourceRegistry")
            .field("pending", &state.releases.len())
            .field("closed", &state.closed)
            .finish()
    }
}

type SharedStream = Arc<Mutex<Option<Box<dyn Read + Send>>>>;

/// A byte stream whose lifetime is bound to a data source.
///
/// Reading after the stream (or its data source) has been closed fails with
/// [`io::ErrorKind::BrokenPipe`].
pub struct TrackedReader {
    stream: SharedStream,
}

impl TrackedReader {
    pub(crate) fn track(reader: Box<dyn Read + Send>, registry: &ResourceRegistry) -> Self {
        let stream: SharedStream = Arc::new(Mutex::new(Some(reader)));
        let handle = Arc::clone(&stream);
        registry.register(move || {
            handle.lock().unwrap_or_else(PoisonError::into_inner).take();
            Ok(())
        });
        Self {
            stream,
        }
    }

    /// Returns true once the underlying stream has been released.
    pub fn is_closed(&self) -> bool {
        is_released(&self.stream)
    }

    /// Releases the underlying stream now instead of waiting for the data
    /// source to close.
    pub fn close(&self) {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

fn is_released(stream: &SharedStream) -> bool {
    stream.lock().unwrap_or_else(PoisonError::into_inner).is_none()
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(reader) => reader.read(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream has been closed")),
        }
    }
}

impl fmt::Debug for TrackedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedReader").field("closed", &self.is_closed()).finish()
    }
}

/// Lazily decoded lines of a tracked stream.
///
/// Yields lines without their terminators. Once the owning data source is
/// closed the next call yields an error.
pub struct LineIterator {
    stream: SharedStream,
    lines: io::Lines<BufReader<DecodeReaderBytes<TrackedReader, Vec<u8>>>>,
}

impl LineIterator {
    pub(crate) fn new(reader: TrackedReader, charset: &'static Encoding) -> Self {
        let stream = Arc::clone(&reader.stream);
        let decoder = DecodeReaderBytesBuilder::new().encoding(Some(charset)).build(reader);
        Self {
            stream,
            lines: BufReader::new(decoder).lines(),
        }
    }

    /// Returns true once the underlying stream has been released.
    pub fn is_closed(&self) -> bool {
        is_released(&self.stream)
    }

    /// Releases the underlying stream now.
    pub fn close(&self) {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl Iterator for LineIterator {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}
