//! Error types for archive reading.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when decoding an archive, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Sentinels are not errors
//!
//! Two conditions are deliberately *not* represented here:
//!
//! - **End of archive** is `Ok(None)` from [`Archive::next_entry`].
//! - **End of entry** is `Ok(0)` from the entry's [`std::io::Read`] impl.
//!
//! Callers therefore distinguish "no more data" from "data is broken" from
//! "misuse of a closed session" by type alone:
//!
//! ```rust,no_run
//! use unarch::{Archive, Error};
//! use std::io::Cursor;
//!
//! fn count(bytes: Vec<u8>) -> unarch::Result<usize> {
//!     let mut archive = Archive::open(Cursor::new(bytes))?;
//!     let mut n = 0;
//!     loop {
//!         match archive.next_entry() {
//!             Ok(Some(mut entry)) => {
//!                 entry.skip()?;
//!                 n += 1;
//!             }
//!             Ok(None) => return Ok(n),
//!             Err(Error::Engine { message, .. }) => {
//!                 eprintln!("archive is corrupt: {message}");
//!                 return Ok(n);
//!             }
//!             Err(e) => return Err(e),
//!         }
//!     }
//! }
//! ```
//!
//! [`Archive::next_entry`]: crate::Archive::next_entry

use std::ffi::CStr;
use std::io;

use crate::ffi;

/// A specialized `Result` type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for archive reading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error reported by the wrapped byte source.
    ///
    /// The byte-source adapter converts source faults into the engine's
    /// callback-error sentinel at the FFI boundary and stashes the original
    /// `io::Error`; the session surfaces it here as the root cause instead
    /// of the engine's generic "client read error" message.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The decoding engine reported a failure.
    ///
    /// Raised when engine construction, capability negotiation, or the open
    /// handshake fails (the session is never partially usable afterwards),
    /// and for mid-stream faults such as corrupt or truncated containers.
    /// `code` is the engine-reported errno; `op` names the failing engine
    /// call.
    #[error("libarchive {op}: {message}")]
    Engine {
        /// The engine call that failed.
        op: &'static str,
        /// The engine-reported error number (0 if unavailable).
        code: i32,
        /// The engine-reported error message.
        message: String,
    },

    /// An operation was attempted on an already-closed session.
    #[error("archive is closed")]
    Closed,
}

impl Error {
    /// Snapshots the engine's error state into an [`Error::Engine`].
    ///
    /// Must be called before the handle is freed; after teardown the error
    /// accessors are off limits.
    pub(crate) fn engine(a: *mut ffi::archive, op: &'static str) -> Self {
        if a.is_null() {
            return Error::Engine {
                op,
                code: 0,
                message: format!("{op} failed"),
            };
        }
        let code = unsafe { ffi::archive_errno(a) };
        let msg = unsafe { ffi::archive_error_string(a) };
        let message = if msg.is_null() {
            format!("{op} failed (error code {code})")
        } else {
            unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
        };
        Error::Engine {
            op,
            code: code as i32,
            message,
        }
    }
}
