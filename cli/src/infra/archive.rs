//! Archive infrastructure: implements `ArchiveExtractor` for `.tar.gz` files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::application::ports::ArchiveExtractor;
use crate::domain::ExtractError;

/// Unpacks gzip-compressed tar archives with `tar` + `flate2`.
///
/// Entries escaping the target directory (`..`, absolute paths) are skipped
/// by `tar::Archive::unpack`.
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), ExtractError> {
        let file = File::open(archive).map_err(|source| ExtractError::Open {
            path: archive.to_path_buf(),
            source,
        })?;

        std::fs::create_dir_all(target).map_err(|source| ExtractError::CreateDir {
            path: target.to_path_buf(),
            source,
        })?;

        let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        tar.set_preserve_permissions(true);
        tar.set_overwrite(true);
        tar.unpack(target).map_err(|source| ExtractError::Unpack {
            archive: archive.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })
    }
}
