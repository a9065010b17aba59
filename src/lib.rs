//! # unarch
//!
//! A streaming archive reader over libarchive: any container format and
//! compression filter the engine supports, decoded from any byte source,
//! exposed as sequential entries with `std::io`-flavored content access.
//!
//! Format and filter detection is automatic; a gzipped tar, a zip file, and
//! a zstd-compressed cpio all go through the same three calls.
//!
//! ## Quick Start
//!
//! ### Listing an archive
//!
//! ```rust,no_run
//! use std::io::Cursor;
//!
//! fn main() -> unarch::Result<()> {
//!     let bytes = std::fs::read("snapshot.tar.gz")?;
//!     unarch::walk(Cursor::new(bytes), |entry| {
//!         println!("{} {:>9} {}", entry.strmode(), entry.size(), entry.name());
//!         Ok(())
//!     })
//! }
//! ```
//!
//! ### Reading entry contents
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::Read;
//! use unarch::Archive;
//!
//! fn main() -> unarch::Result<()> {
//!     let mut archive = Archive::open_seekable(File::open("assets.zip")?)?;
//!     while let Some(mut entry) = archive.next_entry()? {
//!         if entry.is_file() && entry.name().ends_with(".txt") {
//!             let mut text = String::new();
//!             entry.read_to_string(&mut text)?;
//!             println!("{text}");
//!         }
//!         // Unread content is fine; the next advance skips past it.
//!     }
//!     archive.close()
//! }
//! ```
//!
//! ## Byte sources
//!
//! [`Archive::open`] takes any `Read`; [`Archive::open_seekable`] takes a
//! `Read + Seek` and additionally registers the engine's seek hook, which
//! some container formats (zip, 7z) use to jump to their central
//! directories. A non-seekable source never gets a seek hook; formats that
//! want one fall back to the engine's forward-read emulation. Blocking and
//! timeout behavior belong entirely to the wrapped source.
//!
//! ## Sessions are single-threaded
//!
//! The engine calls back into the byte source synchronously from inside
//! [`Archive::next_entry`], entry reads, and [`Archive::close`]. A session
//! has no internal synchronization; wrap it in a mutex if it must cross
//! threads.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. End-of-archive (`Ok(None)`) and
//! end-of-entry (`Ok(0)` from `read`) are sentinels, distinct from
//! [`Error`] values; see the [`error`] module for the taxonomy.
//!
//! ## File modes
//!
//! The [`mode`] module is a self-contained POSIX file-mode model: packed
//! mode words, the generic [`FileMode`] form, and the total
//! [`strmode`] renderer producing `ls`-style strings such as
//! `"drwxr-xr-x "`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Size of the adapter's reusable read buffer (32 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 32 * 1024;

pub mod entry;
pub mod error;
pub mod mode;
pub mod reader;
pub mod walk;

mod ffi;
mod handle;
mod source;

pub use entry::Entry;
pub use error::{Error, Result};
pub use mode::{FileKind, FileMode, strmode};
pub use reader::Archive;
pub use walk::walk;
