use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::de::IoRead;

use crate::classifier::classify;
use crate::config::DecoderConfig;
use crate::engine::{self, Excerpt, RawError};
use crate::error::Result;

const CHUNK_SIZE: usize = 8 * 1024;

/// Bytes the engine may have peeked past the end of a number and still holds
/// for the next value. No complete JSON value ends with one of them.
const HELD: [u8; 6] = [b'{', b'[', b't', b'f', b'n', b'-'];

/// Decodes a sequence of JSON values from a reader.
///
/// Each decoder owns the cursor of its stream; share it between threads only
/// behind a lock.
pub struct Decoder<R: Read> {
    de: serde_json::Deserializer<IoRead<Recorder<R>>>,
    tap: Arc<Tap>,
    config: DecoderConfig,
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder that ignores object fields the target does not
    /// declare.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    /// Creates a decoder that fails with
    /// [`ErrorKind::UnexpectedField`](crate::ErrorKind::UnexpectedField) on
    /// object fields the target does not declare.
    pub fn new_strict(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default().strict(true))
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        let tap = Arc::new(Tap::new(config.window()));
        let recorder = Recorder::new(reader, Arc::clone(&tap));
        Self { de: serde_json::Deserializer::from_reader(recorder), tap, config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Reads the next JSON value from the stream.
    ///
    /// Once the stream holds nothing but whitespace the error reports
    /// [`Error::is_end_of_stream`](crate::Error::is_end_of_stream).
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.tap.window().mark(self.tap.consumed());

        let failure = match engine::deserialize::<T, _>(&mut self.de, self.config.strict) {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        let consumed = self.tap.consumed();
        let window = self.tap.window();
        let raw = if failure.is_eof_before_value() && window.is_blank_since_mark(consumed) {
            RawError::EndOfStream
        } else {
            let recent = window.before(consumed);
            failure.into_raw::<T>(Excerpt::around(&recent, recent.len(), &self.config))
        };
        Err(classify(raw))
    }
}

/// State shared between a [`Decoder`] and the reader inside its engine.
#[derive(Debug)]
struct Tap {
    window: Mutex<Window>,
    consumed: AtomicUsize,
}

impl Tap {
    fn new(capacity: usize) -> Self {
        Self { window: Mutex::new(Window::new(capacity)), consumed: AtomicUsize::new(0) }
    }

    /// Bytes handed to the engine so far.
    fn consumed(&self) -> usize {
        self.consumed.load(Ordering::Relaxed)
    }

    fn window(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Recent stream bytes, addressed by their absolute offset.
///
/// Holds at least `capacity` bytes before the engine's position plus the
/// chunk the reader is currently handing out.
#[derive(Debug)]
struct Window {
    bytes: VecDeque<u8>,
    start: usize,
    capacity: usize,
    mark: usize,
    dirty: bool,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self { bytes: VecDeque::new(), start: 0, capacity, mark: 0, dirty: false }
    }

    /// Appends a freshly read chunk once the engine has taken `consumed` bytes.
    fn append(&mut self, consumed: usize, chunk: &[u8]) {
        let keep_from = consumed.saturating_sub(self.capacity.max(1));
        let excess = keep_from.saturating_sub(self.start).min(self.bytes.len());
        let since_mark = self.mark.saturating_sub(self.start).min(excess);
        self.dirty |= self
            .bytes
            .range(since_mark..excess)
            .any(|byte| !byte.is_ascii_whitespace());
        self.bytes.drain(..excess);
        self.start += excess;
        self.bytes.extend(chunk);
    }

    /// Starts a new value at offset `consumed`.
    fn mark(&mut self, consumed: usize) {
        self.mark = consumed;
        self.dirty = consumed
            .checked_sub(1)
            .and_then(|offset| self.byte_at(offset))
            .is_some_and(|byte| HELD.contains(&byte));
    }

    /// True when the engine took nothing but whitespace since the last mark.
    fn is_blank_since_mark(&self, consumed: usize) -> bool {
        !self.dirty
            && self
                .range(self.mark, consumed)
                .all(|byte| byte.is_ascii_whitespace())
    }

    /// Retained bytes the engine has already taken.
    fn before(&self, consumed: usize) -> Vec<u8> {
        self.range(self.start, consumed).collect()
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        offset
            .checked_sub(self.start)
            .and_then(|index| self.bytes.get(index).copied())
    }

    fn range(&self, from: usize, to: usize) -> impl Iterator<Item = u8> + '_ {
        let end = to.saturating_sub(self.start).min(self.bytes.len());
        let begin = from.saturating_sub(self.start).min(end);
        self.bytes.range(begin..end).copied()
    }
}

/// Reader that fills its own chunk buffer and shares each chunk with the
/// [`Window`].
///
/// The engine pulls one byte at a time, so the lock is only taken on refill.
struct Recorder<R> {
    inner: R,
    chunk: Box<[u8]>,
    pos: usize,
    len: usize,
    tap: Arc<Tap>,
}

impl<R: Read> Recorder<R> {
    fn new(inner: R, tap: Arc<Tap>) -> Self {
        Self { inner, chunk: vec![0; CHUNK_SIZE].into_boxed_slice(), pos: 0, len: 0, tap }
    }
}

impl<R: Read> Read for Recorder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.len {
            let read = self.inner.read(&mut self.chunk)?;
            if read == 0 {
                return Ok(0);
            }
            self.tap.window().append(self.tap.consumed(), &self.chunk[..read]);
            self.pos = 0;
            self.len = read;
        }

        let count = buf.len().min(self.len - self.pos);
        buf[..count].copy_from_slice(&self.chunk[self.pos..self.pos + count]);
        self.pos += count;
        self.tap.consumed.fetch_add(count, Ordering::Relaxed);
        Ok(count)
    }
}
