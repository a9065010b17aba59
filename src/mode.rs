//! POSIX file-mode model.
//!
//! One canonical bit table covers both directions of the mode translation:
//! a generic [`FileMode`] packs into the POSIX mode word via
//! [`FileMode::bits`], and any mode word renders to the `ls`-style
//! symbolic form via [`strmode`]. Pure functions, no I/O.
//!
//! # Bit layout
//!
//! | Group | Bits |
//! |-------|------|
//! | File type | `S_IFMT` mask (`0xF000`), 7 mutually exclusive patterns |
//! | Special | `S_ISUID`, `S_ISGID`, `S_ISVTX` |
//! | Permissions | `rwx` triplets for owner, group, other (`0o777`) |
//!
//! # Example
//!
//! ```rust
//! use unarch::mode::{strmode, FileKind, FileMode};
//!
//! let mode = FileMode {
//!     kind: Some(FileKind::Directory),
//!     permissions: 0o755,
//!     ..FileMode::default()
//! };
//! assert_eq!(strmode(mode.bits()), "drwxr-xr-x ");
//! ```

/// Mask isolating the file-type bits.
pub const S_IFMT: u32 = 0xF000;
/// Socket.
pub const S_IFSOCK: u32 = 0xC000;
/// Symbolic link.
pub const S_IFLNK: u32 = 0xA000;
/// Regular file.
pub const S_IFREG: u32 = 0x8000;
/// Block device.
pub const S_IFBLK: u32 = 0x6000;
/// Directory.
pub const S_IFDIR: u32 = 0x4000;
/// Character device.
pub const S_IFCHR: u32 = 0x2000;
/// Named pipe (FIFO).
pub const S_IFIFO: u32 = 0x1000;

/// Set-user-ID on execution.
pub const S_ISUID: u32 = 0x800;
/// Set-group-ID on execution.
pub const S_ISGID: u32 = 0x400;
/// Sticky bit.
pub const S_ISVTX: u32 = 0x200;

/// Owner read.
pub const S_IRUSR: u32 = 0x100;
/// Owner write.
pub const S_IWUSR: u32 = 0x80;
/// Owner execute.
pub const S_IXUSR: u32 = 0x40;
/// Group read.
pub const S_IRGRP: u32 = 0x20;
/// Group write.
pub const S_IWGRP: u32 = 0x10;
/// Group execute.
pub const S_IXGRP: u32 = 0x8;
/// Other read.
pub const S_IROTH: u32 = 0x4;
/// Other write.
pub const S_IWOTH: u32 = 0x2;
/// Other execute.
pub const S_IXOTH: u32 = 0x1;

/// The seven recognized file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharDevice,
    /// Named pipe (FIFO).
    Fifo,
    /// Socket.
    Socket,
}

impl FileKind {
    /// Returns the type bit-pattern for this kind.
    pub fn to_bits(self) -> u32 {
        match self {
            FileKind::Regular => S_IFREG,
            FileKind::Directory => S_IFDIR,
            FileKind::Symlink => S_IFLNK,
            FileKind::BlockDevice => S_IFBLK,
            FileKind::CharDevice => S_IFCHR,
            FileKind::Fifo => S_IFIFO,
            FileKind::Socket => S_IFSOCK,
        }
    }

    /// Extracts the kind from a packed mode word.
    ///
    /// Returns `None` when the type bits match none of the seven patterns.
    pub fn from_bits(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            S_IFREG => Some(FileKind::Regular),
            S_IFDIR => Some(FileKind::Directory),
            S_IFLNK => Some(FileKind::Symlink),
            S_IFBLK => Some(FileKind::BlockDevice),
            S_IFCHR => Some(FileKind::CharDevice),
            S_IFIFO => Some(FileKind::Fifo),
            S_IFSOCK => Some(FileKind::Socket),
            _ => None,
        }
    }
}

/// Generic file-mode representation: type, permissions, and special bits.
///
/// This is the authoritative form; the packed mode word is derived from it
/// with [`FileMode::bits`] and recovered with [`FileMode::from_bits`]. The
/// two forms are losslessly inter-derivable for the seven recognized types
/// and the three special bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileMode {
    /// File type; `None` packs as [`FileKind::Regular`].
    pub kind: Option<FileKind>,
    /// Permission bits (`0o777` space; anything else is masked off).
    pub permissions: u32,
    /// Set-user-ID flag.
    pub set_uid: bool,
    /// Set-group-ID flag.
    pub set_gid: bool,
    /// Sticky flag.
    pub sticky: bool,
}

impl FileMode {
    /// Packs into a POSIX mode word.
    ///
    /// Permission bits map 1:1, the type maps to exactly one of the seven
    /// patterns (absent type defaults to regular), and the three special
    /// bits are applied independently of type.
    pub fn bits(&self) -> u32 {
        let mut bits = self.permissions & 0o777;
        bits |= self.kind.unwrap_or(FileKind::Regular).to_bits();
        if self.set_uid {
            bits |= S_ISUID;
        }
        if self.set_gid {
            bits |= S_ISGID;
        }
        if self.sticky {
            bits |= S_ISVTX;
        }
        bits
    }

    /// Unpacks a POSIX mode word.
    ///
    /// `kind` is `None` when the type bits match none of the seven
    /// recognized patterns.
    pub fn from_bits(mode: u32) -> Self {
        FileMode {
            kind: FileKind::from_bits(mode),
            permissions: mode & 0o777,
            set_uid: mode & S_ISUID != 0,
            set_gid: mode & S_ISGID != 0,
            sticky: mode & S_ISVTX != 0,
        }
    }
}

/// Renders a packed mode word as an 11-character `ls`-style string.
///
/// Position 0 is the type glyph (`?` when no type pattern matches),
/// positions 1-9 are the three `rwx` triplets with the setuid/setgid/sticky
/// collapsing (`S`/`s`, `S`/`s`, `T`/`t`), and position 10 is a trailing
/// space. Total over every `u32` input.
///
/// ```rust
/// use unarch::mode::strmode;
///
/// assert_eq!(strmode(0o040755), "drwxr-xr-x ");
/// assert_eq!(strmode(0o104755), "-rwsr-xr-x ");
/// ```
pub fn strmode(mode: u32) -> String {
    let mut b = [b'-'; 11];

    b[0] = match mode & S_IFMT {
        S_IFDIR => b'd',
        S_IFCHR => b'c',
        S_IFBLK => b'b',
        S_IFREG => b'-',
        S_IFLNK => b'l',
        S_IFSOCK => b's',
        S_IFIFO => b'p',
        _ => b'?',
    };

    if mode & S_IRUSR != 0 {
        b[1] = b'r';
    }
    if mode & S_IWUSR != 0 {
        b[2] = b'w';
    }
    b[3] = match (mode & S_IXUSR != 0, mode & S_ISUID != 0) {
        (false, false) => b'-',
        (true, false) => b'x',
        (false, true) => b'S',
        (true, true) => b's',
    };

    if mode & S_IRGRP != 0 {
        b[4] = b'r';
    }
    if mode & S_IWGRP != 0 {
        b[5] = b'w';
    }
    b[6] = match (mode & S_IXGRP != 0, mode & S_ISGID != 0) {
        (false, false) => b'-',
        (true, false) => b'x',
        (false, true) => b'S',
        (true, true) => b's',
    };

    if mode & S_IROTH != 0 {
        b[7] = b'r';
    }
    if mode & S_IWOTH != 0 {
        b[8] = b'w';
    }
    b[9] = match (mode & S_IXOTH != 0, mode & S_ISVTX != 0) {
        (false, false) => b'-',
        (true, false) => b'x',
        (false, true) => b'T',
        (true, true) => b't',
    };

    b[10] = b' ';

    // All glyphs are ASCII.
    String::from_utf8_lossy(&b).into_owned()
}
