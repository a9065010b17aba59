//! The archive session: engine lifecycle and sequential entry iteration.
//!
//! [`Archive`] owns one decoding-engine instance, registers the byte-source
//! adapter with it, and walks the container's entries forward. The session
//! has a two-state lifecycle, open → closed; [`close`](Archive::close) is
//! the only transition, it is idempotent, and `Drop` is a last-resort
//! safety net rather than the primary release path.
//!
//! The engine drives input re-entrantly: callbacks fire synchronously
//! inside [`next_entry`](Archive::next_entry), entry reads, and `close`.
//! There is no internal synchronization; callers sharing a session across
//! threads must serialize access externally.

use std::ffi::CStr;
use std::io::{self, Read, Seek};
use std::ptr;
use std::time::{Duration, SystemTime};

use libc::{c_char, c_void};
use log::{debug, trace};

use crate::entry::{Entry, EntryFields};
use crate::error::{Error, Result};
use crate::ffi;
use crate::handle::{self, Token};
use crate::source::{self, SourceState};

/// An opened archive reader.
///
/// Decodes any container format and compression filter the engine knows,
/// auto-detected from the stream's leading bytes. Entries are visited
/// strictly forward with [`next_entry`](Archive::next_entry); the returned
/// [`Entry`] borrows the session mutably, so the previous entry's content
/// cursor can never be used past the next advance.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use unarch::Archive;
///
/// fn main() -> unarch::Result<()> {
///     let mut archive = Archive::open_seekable(File::open("backup.tar.zst")?)?;
///     while let Some(mut entry) = archive.next_entry()? {
///         println!("{}", entry.name());
///         entry.skip()?;
///     }
///     archive.close()
/// }
/// ```
pub struct Archive<'r> {
    /// Exclusive engine handle; null once the session is closed.
    engine: *mut ffi::archive,
    /// Registry token the engine carries as its client data.
    token: Token,
    /// Adapter state; boxed so its address is stable for the registry and
    /// kept alive until after the engine's teardown returns.
    state: Box<SourceState<'r>>,
}

impl<'r> Archive<'r> {
    /// Opens an archive over a forward-only byte source.
    ///
    /// No seek hook is registered; formats that want random access fall
    /// back to the engine's forward-read emulation.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Engine`] if engine construction, capability
    /// negotiation, or the open handshake fails, and with [`Error::Io`]
    /// when the handshake fault originated in the source. Partially
    /// constructed engine state is always released on the error path.
    pub fn open(reader: impl Read + 'r) -> Result<Self> {
        Self::open_with_state(SourceState::streaming(reader))
    }

    /// Opens an archive over a random-access byte source.
    ///
    /// Registers the seek hook; a seek failure at decode time degrades to
    /// forward-read emulation without aborting the session.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Archive::open`].
    pub fn open_seekable(reader: impl Read + Seek + 'r) -> Result<Self> {
        Self::open_with_state(SourceState::seekable(reader))
    }

    fn open_with_state(mut state: Box<SourceState<'r>>) -> Result<Self> {
        let engine = unsafe { ffi::archive_read_new() };
        if engine.is_null() {
            return Err(Error::Engine {
                op: "archive_read_new",
                code: 0,
                message: "engine allocation failed".into(),
            });
        }

        if let Err(e) = Self::negotiate(engine, state.is_seekable()) {
            unsafe { ffi::archive_read_free(engine) };
            return Err(e);
        }

        // The engine only ever sees the token, never the state's address.
        // Registration happens before the open handshake because the engine
        // pulls its first bytes from inside archive_read_open.
        let state_ptr =
            state.as_mut() as *mut SourceState<'r> as *mut SourceState<'static>;
        let token = handle::register(state_ptr);

        let rc = unsafe {
            ffi::archive_read_open(
                engine,
                token.as_client_data(),
                None,
                Some(source::read_callback),
                Some(source::close_callback),
            )
        };
        if rc != ffi::ARCHIVE_OK {
            let err = match state.take_deferred() {
                Some(io_err) => Error::Io(io_err),
                None => Error::engine(engine, "archive_read_open"),
            };
            unsafe { ffi::archive_read_free(engine) };
            handle::deregister(token);
            return Err(err);
        }

        debug!(
            "opened archive session {token:?} (seekable: {})",
            state.is_seekable()
        );
        Ok(Self {
            engine,
            token,
            state,
        })
    }

    /// Enables every known container format and filter and conditionally
    /// installs the seek hook.
    fn negotiate(engine: *mut ffi::archive, seekable: bool) -> Result<()> {
        if unsafe { ffi::archive_read_support_filter_all(engine) } != ffi::ARCHIVE_OK {
            return Err(Error::engine(engine, "archive_read_support_filter_all"));
        }
        if unsafe { ffi::archive_read_support_format_all(engine) } != ffi::ARCHIVE_OK {
            return Err(Error::engine(engine, "archive_read_support_format_all"));
        }
        if seekable
            && unsafe { ffi::archive_read_set_seek_callback(engine, source::seek_callback) }
                != ffi::ARCHIVE_OK
        {
            return Err(Error::engine(engine, "archive_read_set_seek_callback"));
        }
        Ok(())
    }

    /// Advances to the next entry and returns its header.
    ///
    /// Returns `Ok(None)` at the end of the archive; that is a sentinel,
    /// not an error. The engine's read cursor moves forward on the next
    /// call regardless of whether the previous entry's content was drained.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] on a closed session, [`Error::Io`] when the fault
    /// originated in the byte source, otherwise [`Error::Engine`] with the
    /// engine's code and message.
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_, 'r>>> {
        let engine = self.engine_or_closed()?;

        let mut raw: *mut ffi::archive_entry = ptr::null_mut();
        let rc = unsafe { ffi::archive_read_next_header(engine, &mut raw) };
        match rc {
            ffi::ARCHIVE_EOF => {
                trace!("archive session {:?} reached end of archive", self.token);
                Ok(None)
            }
            ffi::ARCHIVE_OK => {
                let fields = unsafe { snapshot_entry(raw) };
                Ok(Some(Entry::new(self, fields)))
            }
            _ => Err(self.fault("archive_read_next_header")),
        }
    }

    /// Closes the session and releases the engine.
    ///
    /// Idempotent; the second and later calls are no-ops. A "warning"
    /// release status from the engine is treated as success.
    ///
    /// # Errors
    ///
    /// [`Error::Engine`] only if the underlying release reports a hard
    /// failure. The session is closed either way.
    pub fn close(&mut self) -> Result<()> {
        if self.engine.is_null() {
            return Ok(());
        }
        let engine = self.engine;
        self.engine = ptr::null_mut();

        let rc = unsafe { ffi::archive_read_free(engine) };
        // The engine fires the close callback from inside the free call;
        // the token must stay resolvable until that returns.
        handle::deregister(self.token);
        debug!("closed archive session {:?} (rc {rc})", self.token);

        if rc == ffi::ARCHIVE_OK || rc == ffi::ARCHIVE_WARN {
            Ok(())
        } else {
            Err(Error::Engine {
                op: "archive_read_free",
                code: rc,
                message: "engine release reported a hard failure".into(),
            })
        }
    }

    /// Returns true once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.engine.is_null()
    }

    fn engine_or_closed(&self) -> Result<*mut ffi::archive> {
        if self.engine.is_null() {
            Err(Error::Closed)
        } else {
            Ok(self.engine)
        }
    }

    /// Wraps the engine's current error state, preferring a deferred source
    /// fault as the root cause.
    fn fault(&mut self, op: &'static str) -> Error {
        match self.state.take_deferred() {
            Some(io_err) => Error::Io(io_err),
            None => Error::engine(self.engine, op),
        }
    }

    /// Pulls entry content from the engine's current decode position.
    ///
    /// `io::Read` semantics: `Ok(0)` once the entry is exhausted. A
    /// zero-length destination never reaches the engine.
    pub(crate) fn read_data(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let engine = match self.engine_or_closed() {
            Ok(engine) => engine,
            Err(e) => return Err(io::Error::other(e)),
        };

        let n =
            unsafe { ffi::archive_read_data(engine, buf.as_mut_ptr() as *mut c_void, buf.len()) };
        if n >= 0 {
            Ok(n as usize)
        } else {
            Err(match self.fault("archive_read_data") {
                Error::Io(io_err) => io_err,
                other => io::Error::other(other),
            })
        }
    }

    /// Discards the current entry's remaining content without copying it
    /// into host memory.
    pub(crate) fn skip_data(&mut self) -> Result<()> {
        let engine = self.engine_or_closed()?;
        if unsafe { ffi::archive_read_data_skip(engine) } != ffi::ARCHIVE_OK {
            return Err(self.fault("archive_read_data_skip"));
        }
        Ok(())
    }
}

impl Drop for Archive<'_> {
    /// Last-resort release; idempotent with the explicit [`Archive::close`]
    /// and never relied upon for deterministic timing.
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Archive<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("token", &self.token)
            .field("closed", &self.is_closed())
            .field("seekable", &self.state.is_seekable())
            .finish()
    }
}

/// Copies one entry's metadata out of the engine-owned header.
///
/// # Safety
/// `raw` must be the live entry pointer produced by the immediately
/// preceding `archive_read_next_header` call.
unsafe fn snapshot_entry(raw: *mut ffi::archive_entry) -> EntryFields {
    let pathname = unsafe { own_cstr(ffi::archive_entry_pathname(raw)) }
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_owned();

    let filetype = unsafe { ffi::archive_entry_filetype(raw) } as u32;
    let link_target = if filetype == ffi::AE_IFLNK {
        unsafe { own_cstr(ffi::archive_entry_symlink(raw)) }
    } else {
        None
    };

    let modified = if unsafe { ffi::archive_entry_mtime_is_set(raw) } != 0 {
        let sec = unsafe { ffi::archive_entry_mtime(raw) } as i64;
        let nsec = unsafe { ffi::archive_entry_mtime_nsec(raw) } as i64;
        Some(unix_system_time(sec, nsec))
    } else {
        None
    };

    EntryFields {
        pathname,
        link_target,
        uid: unsafe { ffi::archive_entry_uid(raw) },
        gid: unsafe { ffi::archive_entry_gid(raw) },
        uname: unsafe { own_cstr(ffi::archive_entry_uname(raw)) },
        gname: unsafe { own_cstr(ffi::archive_entry_gname(raw)) },
        modified,
        mode: unsafe { ffi::archive_entry_mode(raw) } as u32,
        size: unsafe { ffi::archive_entry_size(raw) }.max(0) as u64,
    }
}

/// Copies an engine-owned C string, `None` for null or empty.
unsafe fn own_cstr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    if s.is_empty() { None } else { Some(s) }
}

fn unix_system_time(sec: i64, nsec: i64) -> SystemTime {
    let nanos = Duration::from_nanos(nsec.clamp(0, 999_999_999) as u64);
    if sec >= 0 {
        SystemTime::UNIX_EPOCH + Duration::from_secs(sec as u64) + nanos
    } else {
        SystemTime::UNIX_EPOCH - Duration::from_secs(sec.unsigned_abs()) + nanos
    }
}
