//! Raw bindings for the libarchive read API.
//!
//! Only the subset of libarchive that the streaming reader drives is
//! declared here: construction and teardown of a read handle, capability
//! negotiation, the callback-driven open, header/data advancement, and the
//! error accessors. Entry getters cover the metadata the [`Entry`] snapshot
//! carries.
//!
//! # Invariants and safety
//! - `archive` and `archive_entry` are opaque; the crate never inspects or
//!   copies them, only passes the pointers back to the engine.
//! - Entry pointers returned by `archive_read_next_header` are owned by the
//!   engine and valid only until the next header call.
//! - Registered callbacks must never panic or unwind across the FFI
//!   boundary.
//!
//! [`Entry`]: crate::Entry

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_long, c_void, mode_t, size_t, ssize_t, time_t};

/// Opaque libarchive read handle.
#[repr(C)]
pub struct archive {
    _private: [u8; 0],
}

/// Opaque libarchive entry handle.
#[repr(C)]
pub struct archive_entry {
    _private: [u8; 0],
}

/// Operation completed successfully.
pub const ARCHIVE_OK: c_int = 0;
/// No more entries in the archive.
pub const ARCHIVE_EOF: c_int = 1;
/// Operation completed with a non-fatal warning.
pub const ARCHIVE_WARN: c_int = -20;
/// Unrecoverable engine failure; the handle is unusable afterwards.
pub const ARCHIVE_FATAL: c_int = -30;

/// File-type bits of a symbolic link in the engine's `AE_IF*` space.
pub const AE_IFLNK: u32 = 0o120000;

/// Pull callback: fill a buffer and publish it through `buffer`.
///
/// Returns the number of bytes produced, `0` at end-of-data, or a negative
/// value on failure.
pub type archive_read_callback = unsafe extern "C" fn(
    a: *mut archive,
    client_data: *mut c_void,
    buffer: *mut *const c_void,
) -> ssize_t;

/// Random-access callback. Returns the new absolute offset, or
/// [`ARCHIVE_FATAL`] on failure (the engine then emulates with forward
/// reads).
pub type archive_seek_callback =
    unsafe extern "C" fn(a: *mut archive, client_data: *mut c_void, offset: i64, whence: c_int) -> i64;

/// Teardown notification. Invoked by the engine during its own close or
/// error unwinding; resource release stays with the host.
pub type archive_close_callback =
    unsafe extern "C" fn(a: *mut archive, client_data: *mut c_void) -> c_int;

/// Optional open notification; the reader passes `None`.
pub type archive_open_callback =
    unsafe extern "C" fn(a: *mut archive, client_data: *mut c_void) -> c_int;

#[link(name = "archive")]
unsafe extern "C" {
    pub fn archive_read_new() -> *mut archive;
    pub fn archive_read_free(a: *mut archive) -> c_int;

    pub fn archive_read_support_filter_all(a: *mut archive) -> c_int;
    pub fn archive_read_support_format_all(a: *mut archive) -> c_int;

    pub fn archive_read_set_seek_callback(a: *mut archive, cb: archive_seek_callback) -> c_int;
    pub fn archive_read_open(
        a: *mut archive,
        client_data: *mut c_void,
        open_cb: Option<archive_open_callback>,
        read_cb: Option<archive_read_callback>,
        close_cb: Option<archive_close_callback>,
    ) -> c_int;

    pub fn archive_read_next_header(a: *mut archive, entry: *mut *mut archive_entry) -> c_int;
    pub fn archive_read_data(a: *mut archive, buf: *mut c_void, len: size_t) -> ssize_t;
    pub fn archive_read_data_skip(a: *mut archive) -> c_int;

    pub fn archive_errno(a: *mut archive) -> c_int;
    pub fn archive_error_string(a: *mut archive) -> *const c_char;

    pub fn archive_entry_pathname(e: *mut archive_entry) -> *const c_char;
    pub fn archive_entry_symlink(e: *mut archive_entry) -> *const c_char;
    pub fn archive_entry_filetype(e: *mut archive_entry) -> mode_t;
    pub fn archive_entry_mode(e: *mut archive_entry) -> mode_t;
    pub fn archive_entry_uid(e: *mut archive_entry) -> i64;
    pub fn archive_entry_gid(e: *mut archive_entry) -> i64;
    pub fn archive_entry_uname(e: *mut archive_entry) -> *const c_char;
    pub fn archive_entry_gname(e: *mut archive_entry) -> *const c_char;
    pub fn archive_entry_mtime(e: *mut archive_entry) -> time_t;
    pub fn archive_entry_mtime_nsec(e: *mut archive_entry) -> c_long;
    pub fn archive_entry_mtime_is_set(e: *mut archive_entry) -> c_int;
    pub fn archive_entry_size(e: *mut archive_entry) -> i64;
}
