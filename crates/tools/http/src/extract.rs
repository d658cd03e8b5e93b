//! Gzip-compressed tar extraction.

use flate2::read::GzDecoder;
use rubyboot_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;
use tar::Archive;
use tracing::trace;

/// Unpack the `.tgz` in `data` into `dest`, returning the entry count.
///
/// Leading `/` is stripped from entry paths. An entry with a `..`
/// component fails the whole extraction rather than being skipped.
///
/// # Errors
///
/// Returns [`Error::Extraction`] for corrupt or truncated data, unsafe
/// entry paths, and archives with no entries.
pub fn unpack_tar_gz(data: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    std::fs::create_dir_all(dest).map_err(|e| Error::io(e, dest, "create directory"))?;

    let entries = archive
        .entries()
        .map_err(|e| Error::extraction(format!("failed to read archive: {e}")))?;

    let mut count = 0;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::extraction(format!("failed to read archive entry: {e}")))?;
        let entry_path = entry
            .path()
            .map_err(|e| Error::extraction(format!("invalid path in archive: {e}")))?
            .into_owned();

        let unpacked = entry.unpack_in(dest).map_err(|e| {
            Error::extraction(format!("failed to unpack {}: {e}", entry_path.display()))
        })?;
        if !unpacked {
            return Err(Error::extraction(format!(
                "refusing to unpack {} outside the install directory",
                entry_path.display()
            )));
        }
        trace!(path = %entry_path.display(), "Unpacked entry");
        count += 1;
    }

    if count == 0 {
        return Err(Error::extraction("archive is empty"));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, EntryType, Header};
    use tempfile::TempDir;

    fn tarball(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);
        for (path, content, mode) in files {
            let mut header = Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append(&header, &content[..]).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_unpacks_tree_and_modes() {
        let temp = TempDir::new().unwrap();
        let data = tarball(&[
            ("bin/ruby", b"#!/bin/sh\n", 0o755),
            ("lib/libruby.so", b"\x7fELF", 0o644),
        ]);

        let count = unpack_tar_gz(&data, temp.path()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read(temp.path().join("bin/ruby")).unwrap(),
            b"#!/bin/sh\n"
        );
        assert!(rubyboot_core::runtime::is_executable(
            &temp.path().join("bin/ruby")
        ));
        assert!(!rubyboot_core::runtime::is_executable(
            &temp.path().join("lib/libruby.so")
        ));
    }

    #[test]
    fn test_corrupt_data_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let err = unpack_tar_gz(b"definitely not gzip", temp.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_empty_archive_is_rejected() {
        let temp = TempDir::new().unwrap();
        let data = tarball(&[]);

        let err = unpack_tar_gz(&data, temp.path()).unwrap_err();
        assert!(err.to_string().contains("archive is empty"));
    }

    #[test]
    fn test_parent_traversal_is_rejected() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("install");

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);
        let mut header = Header::new_gnu();
        // set_path refuses `..`, so write the name bytes directly.
        let name = b"../escaped";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_entry_type(EntryType::Regular);
        header.set_size(1);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &b"x"[..]).unwrap();
        let data = builder.into_inner().unwrap().finish().unwrap();

        let err = unpack_tar_gz(&data, &dest).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(!temp.path().join("escaped").exists());
    }
}
