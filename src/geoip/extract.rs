//! Archive extraction utilities.
//!
//! MaxMind distributes GeoLite2 databases as `.tar.gz` archives; this module
//! pulls the `.mmdb` member out of such an archive.

use anyhow::{Context, Result};

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether the bytes look like a gzip stream.
pub(crate) fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Extracts the first `.mmdb` file found in a tar.gz archive.
pub(crate) fn extract_mmdb_from_tar_gz(tar_gz_bytes: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tar::Archive;

    log::debug!("Extracting .mmdb file from tar.gz archive");

    let mut tar_archive = Archive::new(GzDecoder::new(tar_gz_bytes));
    let entries = tar_archive
        .entries()
        .context("Failed to read tar archive entries")?;

    for entry_result in entries {
        let mut entry = entry_result.context("Failed to read tar entry")?;
        let path = entry.path().context("Failed to get entry path")?.into_owned();

        let is_mmdb = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mmdb"));
        if !is_mmdb {
            continue;
        }

        let mut mmdb_bytes = Vec::new();
        entry
            .read_to_end(&mut mmdb_bytes)
            .with_context(|| format!("Failed to read {} from archive", path.display()))?;
        log::info!(
            "Extracted {} from tar.gz ({} bytes)",
            path.display(),
            mmdb_bytes.len()
        );
        return Ok(mmdb_bytes);
    }

    Err(anyhow::anyhow!("no .mmdb file found in tar.gz archive"))
}
