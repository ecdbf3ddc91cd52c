// src/fetcher/worker.rs

//! Worker environment setup

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::Path;
use tar::Archive;
use tracing::debug;

/// Unpack a gzipped worker tarball into `dest`
pub fn extract_worker_archive(archive: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting worker {} into {}", archive.display(), dest.display());

    let file = File::open(archive)
        .map_err(|e| Error::FetcherSetupError(format!("cannot open worker '{}': {}", archive.display(), e)))?;

    std::fs::create_dir_all(dest)?;

    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
        .map_err(|e| Error::FetcherSetupError(format!("cannot extract worker '{}': {}", archive.display(), e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    #[test]
    fn test_extract_worker_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("worker.tar.gz");

        {
            let file = File::create(&archive_path).unwrap();
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            let content = b"[base]\nenabled=1\n";
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "etc/yum.repos.d/base.repo", &content[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let root = dir.path().join("root");
        extract_worker_archive(&archive_path, &root).unwrap();
        assert!(root.join("etc/yum.repos.d/base.repo").is_file());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("worker.tar.gz");
        std::fs::write(&archive_path, b"definitely not gzip").unwrap();

        let result = extract_worker_archive(&archive_path, &dir.path().join("root"));
        assert!(matches!(result, Err(Error::FetcherSetupError(_))));
    }
}
