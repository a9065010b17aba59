//! Byte-source adapter between `std::io` readers and the engine's pull
//! callbacks.
//!
//! The engine drives input through three hooks: read-into-buffer, optional
//! seek, and a close notification. [`SourceState`] wraps the caller's
//! reader behind those hooks, holding the reusable read buffer the engine
//! borrows from and a slot for deferring the original `io::Error` across
//! the FFI boundary.
//!
//! # Callback contract
//! - The callbacks are invoked synchronously and re-entrantly from within
//!   the session's own calls; there is no background delivery.
//! - No host panic or error value ever crosses into the engine: faults are
//!   converted to the engine's error sentinel, and every callback body is
//!   wrapped in `catch_unwind`.
//! - The close hook is a notification only; releasing the adapter is the
//!   session's job, which avoids double-release when the engine closes
//!   internally during its own error unwinding.

use std::io::{self, Read, Seek, SeekFrom};
use std::panic::{self, AssertUnwindSafe};

use libc::{c_int, c_void, ssize_t};
use log::trace;

use crate::READ_BUFFER_SIZE;
use crate::ffi;
use crate::handle::{self, Token};

/// Object-safe pairing of `Read` and `Seek` for seekable sources.
pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// The wrapped byte source, split by random-access capability.
///
/// The variant is fixed at open time; the seek hook is only registered with
/// the engine for [`Source::Seekable`].
pub(crate) enum Source<'r> {
    Stream(Box<dyn Read + 'r>),
    Seekable(Box<dyn ReadSeek + 'r>),
}

/// Live adapter state reachable from the engine's callbacks.
pub(crate) struct SourceState<'r> {
    source: Source<'r>,
    /// Reusable read buffer the engine borrows between read callbacks.
    buf: Vec<u8>,
    /// Source fault captured in a callback, surfaced by the session as the
    /// root cause of the next engine failure.
    deferred: Option<io::Error>,
}

impl<'r> SourceState<'r> {
    /// Wraps a forward-only reader.
    pub(crate) fn streaming(reader: impl Read + 'r) -> Box<Self> {
        Box::new(Self {
            source: Source::Stream(Box::new(reader)),
            buf: vec![0; READ_BUFFER_SIZE],
            deferred: None,
        })
    }

    /// Wraps a random-access reader.
    pub(crate) fn seekable(reader: impl Read + Seek + 'r) -> Box<Self> {
        Box::new(Self {
            source: Source::Seekable(Box::new(reader)),
            buf: vec![0; READ_BUFFER_SIZE],
            deferred: None,
        })
    }

    /// True if the wrapped source supports random access.
    pub(crate) fn is_seekable(&self) -> bool {
        matches!(self.source, Source::Seekable(_))
    }

    /// Takes the deferred source fault, if a callback recorded one.
    pub(crate) fn take_deferred(&mut self) -> Option<io::Error> {
        self.deferred.take()
    }

    /// One read of the wrapped source into the reusable buffer.
    ///
    /// `Interrupted` is retried rather than surfaced; any other outcome is
    /// the source's own blocking semantics, opaque to this layer.
    fn fill(&mut self) -> io::Result<usize> {
        loop {
            let result = match &mut self.source {
                Source::Stream(r) => r.read(&mut self.buf),
                Source::Seekable(r) => r.read(&mut self.buf),
            };
            match result {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.source {
            Source::Seekable(r) => r.seek(pos),
            Source::Stream(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "source is not seekable",
            )),
        }
    }
}

/// Read hook: fills the adapter buffer and publishes it to the engine.
///
/// Returns the byte count, `0` at end-of-data, or `-1` on failure (with the
/// `io::Error` stashed for the session to surface).
///
/// # Safety
/// Invoked by the engine with the client-data slot holding a token issued
/// by [`handle::register`]; the state it resolves to is live for the whole
/// engine lifetime. Must never unwind into the engine.
pub(crate) unsafe extern "C" fn read_callback(
    _a: *mut ffi::archive,
    client_data: *mut c_void,
    buffer: *mut *const c_void,
) -> ssize_t {
    let token = Token::from_client_data(client_data);
    let Some(state) = handle::lookup(token) else {
        trace!("read callback for unknown token {token:?}");
        return -1;
    };
    // Sound per the registry contract: the session keeps the state boxed
    // and registered for as long as the engine can call back.
    let state = unsafe { &mut *state };

    match panic::catch_unwind(AssertUnwindSafe(|| state.fill())) {
        Ok(Ok(0)) => 0,
        Ok(Ok(n)) => {
            unsafe { *buffer = state.buf.as_ptr() as *const c_void };
            n as ssize_t
        }
        Ok(Err(e)) => {
            state.deferred = Some(e);
            -1
        }
        Err(_) => {
            state.deferred = Some(io::Error::other("byte source panicked during read"));
            -1
        }
    }
}

/// Seek hook: delegates to the wrapped source's `Seek`.
///
/// Registered only for seekable sources. Failure returns the engine's
/// fatal sentinel; the engine degrades to forward-read emulation rather
/// than aborting the session.
///
/// # Safety
/// Same contract as [`read_callback`].
pub(crate) unsafe extern "C" fn seek_callback(
    _a: *mut ffi::archive,
    client_data: *mut c_void,
    offset: i64,
    whence: c_int,
) -> i64 {
    let token = Token::from_client_data(client_data);
    let Some(state) = handle::lookup(token) else {
        return ffi::ARCHIVE_FATAL as i64;
    };
    let state = unsafe { &mut *state };

    let pos = match whence {
        libc::SEEK_SET if offset >= 0 => SeekFrom::Start(offset as u64),
        libc::SEEK_CUR => SeekFrom::Current(offset),
        libc::SEEK_END => SeekFrom::End(offset),
        _ => return ffi::ARCHIVE_FATAL as i64,
    };

    match panic::catch_unwind(AssertUnwindSafe(|| state.seek(pos))) {
        Ok(Ok(new_offset)) => new_offset as i64,
        Ok(Err(_)) | Err(_) => ffi::ARCHIVE_FATAL as i64,
    }
}

/// Close hook: a notification only, always successful.
///
/// The engine may fire this during its own error unwinding; reporting
/// failure here would re-enter teardown, and the session releases the
/// adapter itself strictly after `archive_read_free` returns.
///
/// # Safety
/// Same contract as [`read_callback`]; performs no dereference at all.
pub(crate) unsafe extern "C" fn close_callback(
    _a: *mut ffi::archive,
    client_data: *mut c_void,
) -> c_int {
    let token = Token::from_client_data(client_data);
    trace!("engine close notification for {token:?}");
    ffi::ARCHIVE_OK
}
