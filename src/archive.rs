// src/archive.rs

//! Zip compression of the SQL dump and removal of local artifacts.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::errors::{BackupError, Result};

/// `<folder>/<stem of filename>.zip`
pub fn archive_path_for(folder: &Path, filename: &str) -> PathBuf {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    folder.join(format!("{stem}.zip"))
}

/// Compress `folder/filename` into a single-entry deflate archive next to it.
///
/// The entry is named `filename` only, without any directory component. An
/// existing archive with the same name is overwritten. The source file is
/// left in place; removing it is the caller's decision.
pub fn compress(folder: &Path, filename: &str) -> Result<PathBuf> {
    let source = folder.join(filename);
    let target = archive_path_for(folder, filename);

    let input = File::open(&source).map_err(|e| {
        BackupError::Compression(format!("opening {}: {e}", source.display()))
    })?;
    let output = File::create(&target).map_err(|e| {
        BackupError::Compression(format!("creating {}: {e}", target.display()))
    })?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(input.metadata().map(|m| m.len() >= u32::MAX as u64).unwrap_or(false));

    let mut zip = ZipWriter::new(BufWriter::new(output));
    zip.start_file(filename, options)?;
    io::copy(&mut BufReader::new(input), &mut zip).map_err(|e| {
        BackupError::Compression(format!("writing {}: {e}", target.display()))
    })?;
    zip.finish()?;

    Ok(target)
}

/// Delete a single file.
pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| BackupError::Filesystem {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
