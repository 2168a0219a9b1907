//! Archive extraction.
//!
//! Release assets are zip archives for windows and tar.gz otherwise. The
//! archive is always unpacked into a staging directory owned by the caller;
//! nothing here touches the cache key itself.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::{Error, Result};

/// Unpack archive bytes into `dest`, choosing the codec by file name.
pub fn unpack(data: &[u8], archive_name: &str, dest: &Path) -> Result<()> {
    if archive_name.ends_with(".zip") {
        unpack_zip(data, archive_name, dest)
    } else if archive_name.ends_with(".tar.gz") || archive_name.ends_with(".tgz") {
        unpack_tar_gz(data, archive_name, dest)
    } else {
        Err(Error::extraction(archive_name, "unrecognized archive format"))
    }
}

fn unpack_zip(data: &[u8], archive_name: &str, dest: &Path) -> Result<()> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| Error::extraction(archive_name, e.to_string()))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::extraction(archive_name, e.to_string()))?;

        // enclosed_name rejects entries escaping the destination
        let Some(relative) = file.enclosed_name() else {
            continue;
        };
        let outpath = dest.join(relative);

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            std::fs::write(&outpath, &content)?;

            #[cfg(unix)]
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}

fn unpack_tar_gz(data: &[u8], archive_name: &str, dest: &Path) -> Result<()> {
    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|e| Error::extraction(archive_name, e.to_string()))
}

/// Find the extracted scanner binary by name.
///
/// Assets keep the binary at the archive root or under `bin/`; both are
/// checked before giving up.
pub fn locate_binary(dir: &Path, binary_name: &str) -> Result<PathBuf> {
    let candidates = [dir.join(binary_name), dir.join("bin").join(binary_name)];
    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| Error::BinaryNotFound(binary_name.to_string()))
}

/// Set the executable permission bit where the OS requires it.
pub fn ensure_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
