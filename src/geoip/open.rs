//! GeoIP database loading from local files.

use std::path::Path;

use chrono::DateTime;
use maxminddb::Reader;

use super::extract::{extract_mmdb_from_tar_gz, is_gzip};
use super::types::GeoIpMetadata;
use crate::error_handling::MapError;

/// Loads a GeoIP database from a `.mmdb` file or a MaxMind `.tar.gz`.
///
/// # Errors
///
/// - [`MapError::FileRead`] if the file cannot be read
/// - [`MapError::DatabaseOpen`] if it is not a MaxMind database (or an archive
///   without one)
pub(crate) fn load_from_file(path: &Path) -> Result<(Reader<Vec<u8>>, GeoIpMetadata), MapError> {
    log::info!("Loading GeoIP database from: {}", path.display());

    let raw = std::fs::read(path).map_err(|source| MapError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let db_bytes = if is_gzip(&raw) {
        extract_mmdb_from_tar_gz(&raw).map_err(|e| MapError::DatabaseOpen {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        })?
    } else {
        raw
    };

    let reader = Reader::from_source(db_bytes).map_err(|e| MapError::DatabaseOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let metadata = extract_metadata(&reader, path);
    if !metadata.has_locations() {
        log::warn!(
            "GeoIP database type {} usually has no coordinates; most relays will be dropped",
            metadata.database_type
        );
    }

    Ok((reader, metadata))
}

/// Extracts metadata from a GeoIP database
pub(crate) fn extract_metadata<T: AsRef<[u8]>>(reader: &Reader<T>, source: &Path) -> GeoIpMetadata {
    let epoch = reader.metadata.build_epoch;
    let version = i64::try_from(epoch)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|built| built.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("build_{}", epoch));

    GeoIpMetadata {
        source: source.display().to_string(),
        database_type: reader.metadata.database_type.clone(),
        version,
        ip_version: reader.metadata.ip_version,
        node_count: reader.metadata.node_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::test_helpers::create_test_tar_gz;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let path = PathBuf::from("nonexistent").join("GeoLite2-City.mmdb");
        match load_from_file(&path) {
            Err(MapError::FileRead { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected FileRead, got {:?}", other.map(|(_, m)| m)),
        }
    }

    #[test]
    fn test_load_malformed_database() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("broken.mmdb");
        std::fs::write(&path, b"this is not a maxmind database").unwrap();

        let err = load_from_file(&path).map(|(_, m)| m).unwrap_err();
        assert!(matches!(err, MapError::DatabaseOpen { .. }), "{:?}", err);
        assert!(err.to_string().starts_with("Database open error"));
    }

    #[test]
    fn test_load_empty_database() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("empty.mmdb");
        std::fs::write(&path, b"").unwrap();

        let err = load_from_file(&path).map(|(_, m)| m).unwrap_err();
        assert!(matches!(err, MapError::DatabaseOpen { .. }));
    }

    #[test]
    fn test_load_archive_without_mmdb() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("GeoLite2-City.tar.gz");
        std::fs::write(&path, create_test_tar_gz(&[("README.txt", b"readme")])).unwrap();

        let err = load_from_file(&path).map(|(_, m)| m).unwrap_err();
        match err {
            MapError::DatabaseOpen { reason, .. } => assert!(reason.contains("no .mmdb")),
            other => panic!("expected DatabaseOpen, got {:?}", other),
        }
    }

    #[test]
    fn test_load_archive_with_corrupt_mmdb() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("GeoLite2-City.tar.gz");
        std::fs::write(
            &path,
            create_test_tar_gz(&[("GeoLite2-City_20240501/GeoLite2-City.mmdb", b"garbage")]),
        )
        .unwrap();

        let err = load_from_file(&path).map(|(_, m)| m).unwrap_err();
        assert!(matches!(err, MapError::DatabaseOpen { .. }));
    }
}
