//! Archive entry headers and content access.
//!
//! An [`Entry`] is an immutable metadata snapshot of one archive entry plus
//! a live content cursor bound to the owning session's decode position. The
//! mutable borrow it holds on the session makes the staleness rule a
//! compile-time guarantee: the session cannot advance (or close) while an
//! entry is alive, and at most one entry's content stream is current.

use std::io::{self, Read};
use std::time::SystemTime;

use crate::error::Result;
use crate::mode::{self, FileKind, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG};
use crate::reader::Archive;

/// Metadata extracted from the engine for one entry.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntryFields {
    pub(crate) pathname: String,
    pub(crate) link_target: Option<String>,
    pub(crate) uid: i64,
    pub(crate) gid: i64,
    pub(crate) uname: Option<String>,
    pub(crate) gname: Option<String>,
    pub(crate) modified: Option<SystemTime>,
    pub(crate) mode: u32,
    pub(crate) size: u64,
}

/// One entry (file, directory, symlink, ...) in an archive.
///
/// Produced by [`Archive::next_entry`]. Metadata is read-only after
/// creation; content is pulled through the [`Read`] impl or discarded with
/// [`skip`](Entry::skip). Reading returns `Ok(0)` once the entry's content
/// is exhausted, repeatedly and without touching the engine for zero-length
/// destination buffers.
///
/// # Example
///
/// ```rust,no_run
/// use std::io::{Cursor, Read};
/// use unarch::Archive;
///
/// fn main() -> unarch::Result<()> {
///     let mut archive = Archive::open(Cursor::new(std::fs::read("a.tar.gz")?))?;
///     while let Some(mut entry) = archive.next_entry()? {
///         println!("{} {:>9} {}", entry.strmode(), entry.size(), entry.name());
///         let mut content = Vec::new();
///         entry.read_to_end(&mut content)?;
///     }
///     archive.close()
/// }
/// ```
pub struct Entry<'a, 'r> {
    archive: &'a mut Archive<'r>,
    fields: EntryFields,
}

impl<'a, 'r> Entry<'a, 'r> {
    pub(crate) fn new(archive: &'a mut Archive<'r>, fields: EntryFields) -> Self {
        Self { archive, fields }
    }

    /// Returns the entry's path within the archive, trailing separators
    /// stripped.
    pub fn name(&self) -> &str {
        &self.fields.pathname
    }

    /// Returns the link target for symbolic links, `None` otherwise.
    pub fn link_target(&self) -> Option<&str> {
        self.fields.link_target.as_deref()
    }

    /// Returns the numeric owner id.
    pub fn uid(&self) -> i64 {
        self.fields.uid
    }

    /// Returns the numeric group id.
    pub fn gid(&self) -> i64 {
        self.fields.gid
    }

    /// Returns the owner name, if the container stores one.
    pub fn owner_name(&self) -> Option<&str> {
        self.fields.uname.as_deref()
    }

    /// Returns the group name, if the container stores one.
    pub fn group_name(&self) -> Option<&str> {
        self.fields.gname.as_deref()
    }

    /// Returns the modification time, `None` when the container does not
    /// record one.
    pub fn modified(&self) -> Option<SystemTime> {
        self.fields.modified
    }

    /// Returns the packed POSIX mode word (type, permission, and special
    /// bits).
    pub fn mode(&self) -> u32 {
        self.fields.mode
    }

    /// Returns the logical (uncompressed) size in bytes.
    pub fn size(&self) -> u64 {
        self.fields.size
    }

    /// Returns true if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.fields.mode & S_IFMT == S_IFDIR
    }

    /// Returns true if the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.fields.mode & S_IFMT == S_IFREG
    }

    /// Returns true if the entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.fields.mode & S_IFMT == S_IFLNK
    }

    /// Returns the file type, `None` if the mode word carries no
    /// recognizable type bits.
    pub fn file_kind(&self) -> Option<FileKind> {
        FileKind::from_bits(self.fields.mode)
    }

    /// Renders the entry's mode word in `ls`-style symbolic form.
    pub fn strmode(&self) -> String {
        mode::strmode(self.fields.mode)
    }

    /// Discards the remaining unread content of this entry.
    ///
    /// The engine skips without decoding into host memory where the
    /// container layout allows it. A no-op when the content was already
    /// fully read.
    pub fn skip(&mut self) -> Result<()> {
        self.archive.skip_data()
    }

    /// Reads the entry's remaining content into a `Vec`.
    ///
    /// The declared size is a container-supplied hint, not a promise; the
    /// initial allocation is capped at one read-buffer's worth and the
    /// vector grows from bytes actually decoded.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let hint = self.fields.size.min(crate::READ_BUFFER_SIZE as u64) as usize;
        let mut data = Vec::with_capacity(hint);
        self.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl Read for Entry<'_, '_> {
    /// Pulls up to `buf.len()` bytes of entry content from the session's
    /// current decode position.
    ///
    /// Returns `Ok(0)` once the entry is exhausted (idempotent), and an
    /// error if the engine reports a decode fault mid-entry.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.archive.read_data(buf)
    }
}

impl std::fmt::Debug for Entry<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.fields.pathname)
            .field("size", &self.fields.size)
            .field("mode", &format_args!("{:#o}", self.fields.mode))
            .field("link_target", &self.fields.link_target)
            .finish_non_exhaustive()
    }
}
