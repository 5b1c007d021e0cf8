//! Shared test helpers for geoip module tests.

#[cfg(test)]
use flate2::{write::GzEncoder, Compression};
#[cfg(test)]
use std::io::Write;

/// Creates a tar.gz archive holding the given `(path, content)` entries.
#[cfg(test)]
pub fn create_test_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut tar_builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(content.len() as u64);
        header.set_cksum();
        tar_builder.append(&header, *content).unwrap();
    }
    let tar_bytes = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}
