//! Integration tests for the archive session, entry access, and walk.
//!
//! Fixtures are synthesized in memory with the `tar` crate (optionally
//! gzipped with `flate2`) so every test drives the real engine end to end
//! through the byte-source adapter.

use std::io::{Cursor, Read, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use unarch::{Archive, Error, walk};

const HELLO: &[u8] = b"hello from the archive\n";

/// A tar stream with a regular file, a directory, and a symlink.
fn sample_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(HELLO.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(1_700_000_000);
    header.set_uid(1000);
    header.set_gid(1000);
    header.set_username("alice").unwrap();
    header.set_groupname("users").unwrap();
    builder.append_data(&mut header, "hello.txt", HELLO).unwrap();

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_mtime(1_700_000_000);
    builder
        .append_data(&mut header, "sub/", std::io::empty())
        .unwrap();

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_mtime(1_700_000_000);
    builder
        .append_link(&mut header, "link", "hello.txt")
        .unwrap();

    builder.into_inner().unwrap()
}

#[test]
fn reads_entries_in_container_order() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();

    let mut entry = archive.next_entry().unwrap().expect("first entry");
    assert_eq!(entry.name(), "hello.txt");
    assert!(entry.is_file());
    assert!(!entry.is_dir());
    assert_eq!(entry.size(), HELLO.len() as u64);
    assert_eq!(entry.mode() & 0o777, 0o644);
    assert_eq!(entry.uid(), 1000);
    assert_eq!(entry.gid(), 1000);
    assert_eq!(entry.owner_name(), Some("alice"));
    assert_eq!(entry.group_name(), Some("users"));
    assert_eq!(entry.link_target(), None);
    let mtime = entry
        .modified()
        .expect("tar stores mtime")
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap();
    assert_eq!(mtime.as_secs(), 1_700_000_000);
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, HELLO);
    drop(entry);

    let entry = archive.next_entry().unwrap().expect("second entry");
    // Trailing path separator is stripped.
    assert_eq!(entry.name(), "sub");
    assert!(entry.is_dir());
    assert_eq!(entry.strmode(), "drwxr-xr-x ");
    drop(entry);

    let entry = archive.next_entry().unwrap().expect("third entry");
    assert_eq!(entry.name(), "link");
    assert!(entry.is_symlink());
    assert_eq!(entry.link_target(), Some("hello.txt"));
    drop(entry);

    assert!(archive.next_entry().unwrap().is_none());
    archive.close().unwrap();
}

#[test]
fn read_at_end_of_entry_is_idempotent() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();

    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, HELLO);

    let mut buf = [0u8; 64];
    assert_eq!(entry.read(&mut buf).unwrap(), 0);
    assert_eq!(entry.read(&mut buf).unwrap(), 0);
}

#[test]
fn zero_length_destination_is_a_noop() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.read(&mut []).unwrap(), 0);

    // Content is still all there afterwards.
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, HELLO);
}

#[test]
fn skip_after_full_read_is_a_noop() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();

    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    entry.skip().unwrap();
    drop(entry);

    assert_eq!(archive.next_entry().unwrap().unwrap().name(), "sub");
}

#[test]
fn skip_discards_unread_content() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();

    let mut entry = archive.next_entry().unwrap().unwrap();
    let mut partial = [0u8; 4];
    assert_eq!(entry.read(&mut partial).unwrap(), 4);
    entry.skip().unwrap();
    drop(entry);

    let entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.name(), "sub");
}

#[test]
fn close_is_idempotent_and_closed_session_rejects_operations() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();
    assert!(!archive.is_closed());

    archive.close().unwrap();
    assert!(archive.is_closed());
    // Second close has no observable effect.
    archive.close().unwrap();

    assert!(matches!(archive.next_entry(), Err(Error::Closed)));
}

#[test]
fn close_is_safe_with_undrained_entries() {
    let mut archive = Archive::open(Cursor::new(sample_tar())).unwrap();
    let entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.name(), "hello.txt");
    drop(entry);
    // hello.txt's content was never read or skipped.
    archive.close().unwrap();
}

#[test]
fn walk_visits_every_entry_in_order() {
    let mut names = Vec::new();
    walk(Cursor::new(sample_tar()), |entry| {
        names.push(entry.name().to_owned());
        Ok(())
    })
    .unwrap();
    assert_eq!(names, ["hello.txt", "sub", "link"]);
}

#[test]
fn walk_skips_unread_content_between_callbacks() {
    let mut sizes = Vec::new();
    walk(Cursor::new(sample_tar()), |entry| {
        // Read a few bytes of some entries, none of others; the walk must
        // advance regardless.
        if entry.is_file() {
            let mut partial = [0u8; 5];
            entry.read(&mut partial).unwrap();
        }
        sizes.push(entry.size());
        Ok(())
    })
    .unwrap();
    assert_eq!(sizes.len(), 3);
}

#[test]
fn walk_aborts_on_first_callback_error() {
    let mut visited = 0usize;
    let err = walk(Cursor::new(sample_tar()), |entry| {
        visited += 1;
        if entry.name() == "sub" {
            return Err(Error::Io(std::io::Error::other("stop here")));
        }
        Ok(())
    })
    .unwrap_err();

    // hello.txt and sub were visited; link was not.
    assert_eq!(visited, 2);
    assert!(err.to_string().contains("stop here"));
}

#[test]
fn gzip_filter_is_autodetected() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&sample_tar()).unwrap();
    let gz = encoder.finish().unwrap();

    let mut archive = Archive::open(Cursor::new(gz)).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.name(), "hello.txt");
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, HELLO);
}

#[test]
fn seekable_file_source_decodes() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&sample_tar()).unwrap();
    use std::io::Seek;
    file.seek(std::io::SeekFrom::Start(0)).unwrap();

    let mut archive = Archive::open_seekable(file).unwrap();
    let mut count = 0;
    while let Some(mut entry) = archive.next_entry().unwrap() {
        entry.skip().unwrap();
        count += 1;
    }
    assert_eq!(count, 3);
    archive.close().unwrap();
}

#[test]
fn seek_failure_degrades_to_forward_reading() {
    struct BrokenSeek<R>(R);
    impl<R: Read> Read for BrokenSeek<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }
    impl<R> std::io::Seek for BrokenSeek<R> {
        fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "seek disabled",
            ))
        }
    }

    // The seek hook is registered but every call fails; the session must
    // fall back to forward reads and still decode everything.
    let mut archive = Archive::open_seekable(BrokenSeek(Cursor::new(sample_tar()))).unwrap();

    let mut entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.name(), "hello.txt");
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, HELLO);
    drop(entry);

    let mut names = vec!["hello.txt".to_owned()];
    while let Some(entry) = archive.next_entry().unwrap() {
        names.push(entry.name().to_owned());
    }
    assert_eq!(names, ["hello.txt", "sub", "link"]);
    archive.close().unwrap();
}

#[test]
fn absurd_declared_size_does_not_preallocate() {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_path("huge.bin").unwrap();
    header.set_size(1u64 << 42);
    header.set_mode(0o644);
    header.set_cksum();

    // Header only; the declared 4 TiB of content never arrives.
    let mut bytes = header.as_bytes().to_vec();
    bytes.extend_from_slice(&[0u8; 1024]);

    let mut archive = Archive::open(Cursor::new(bytes)).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.size(), 1u64 << 42);

    // The size field is container-supplied and must be treated as a hint:
    // collecting the content may fail on the truncated stream, but it must
    // not allocate terabytes up front.
    match entry.read_all() {
        Ok(content) => assert!(content.len() < 4096),
        Err(_) => {}
    }
}

#[test]
fn garbage_input_is_a_decode_error_not_a_panic() {
    let garbage = b"this is definitely not an archive of any kind".to_vec();
    match Archive::open(Cursor::new(garbage)) {
        // Some engines reject at the open handshake, others at the first
        // header; either way it must be an error, not a success.
        Err(_) => {}
        Ok(mut archive) => {
            assert!(archive.next_entry().is_err());
        }
    }
}

#[test]
fn source_read_fault_surfaces_as_io_error() {
    struct Failing {
        fed: usize,
    }
    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.fed == 0 {
                self.fed = 1;
                // One block of tar so the handshake has something to bid on,
                // then a hard fault mid-stream.
                let tar = sample_tar();
                let n = buf.len().min(512);
                buf[..n].copy_from_slice(&tar[..n]);
                Ok(n)
            } else {
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "source went away",
                ))
            }
        }
    }

    let result = Archive::open(Failing { fed: 0 }).and_then(|mut archive| {
        while let Some(mut entry) = archive.next_entry()? {
            let mut sink = Vec::new();
            entry.read_to_end(&mut sink).map_err(Error::Io)?;
        }
        Ok(())
    });

    match result {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
        other => panic!("expected the source fault, got {other:?}"),
    }
}
