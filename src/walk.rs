//! Convenience driver for visiting every entry in an archive.

use std::io::Read;

use log::trace;

use crate::entry::Entry;
use crate::error::Result;
use crate::reader::Archive;

/// Opens an archive over `reader` and invokes `visit` once per entry, in
/// container order.
///
/// After the callback returns, any unread content of the entry is skipped
/// unconditionally so the walk always makes forward progress; the callback
/// may read as much or as little of the entry as it likes. The first error
/// the callback returns aborts the walk immediately and is propagated;
/// entries after it are never visited. End of archive terminates the walk
/// successfully. The session is closed before this function returns,
/// success or failure.
///
/// # Example
///
/// ```rust,no_run
/// use std::io::Cursor;
///
/// fn main() -> unarch::Result<()> {
///     let bytes = std::fs::read("release.tar.xz")?;
///     unarch::walk(Cursor::new(bytes), |entry| {
///         println!("{} {:>9} {}", entry.strmode(), entry.size(), entry.name());
///         Ok(())
///     })
/// }
/// ```
pub fn walk<'r, R, F>(reader: R, mut visit: F) -> Result<()>
where
    R: Read + 'r,
    F: FnMut(&mut Entry<'_, 'r>) -> Result<()>,
{
    let mut archive = Archive::open(reader)?;
    // Error paths rely on the session's Drop to close.
    loop {
        let Some(mut entry) = archive.next_entry()? else {
            break;
        };
        trace!("walk visiting {}", entry.name());
        visit(&mut entry)?;
        entry.skip()?;
    }
    archive.close()
}
