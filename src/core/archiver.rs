//! Zip archive construction for backup targets.
//!
//! A target directory is walked recursively and written into a single zip
//! file: directories become zero-length entries (so empty directories survive
//! a round trip), files are deflate-compressed with their contents copied
//! verbatim. Entry names are the paths relative to the source root.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Builds a zip archive of `source_dir` at `archive_path`.
///
/// Overwrites any existing file at `archive_path`. The first error while
/// walking the tree or writing an entry aborts construction; a partial
/// archive may remain on disk and removing it is the caller's concern
/// (the owning job's drop guard handles it).
pub async fn archive(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let source_dir = source_dir.to_path_buf();
    let archive_path = archive_path.to_path_buf();

    // The walk and the entry writes are all blocking disk I/O.
    tokio::task::spawn_blocking(move || archive_sync(&source_dir, &archive_path)).await?
}

fn archive_sync(source_dir: &Path, archive_path: &Path) -> Result<()> {
    // Overwrite semantics: a stale archive from a previous run must not be
    // appended to.
    let _ = fs::remove_file(archive_path);

    let file = File::create(archive_path)
        .with_context(|| format!("failed to create archive {}", archive_path.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: u64 = 0;
    for entry in WalkDir::new(source_dir).min_depth(1).follow_links(false) {
        let entry = entry
            .with_context(|| format!("failed to walk source tree {}", source_dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .expect("walked entry is under the source root");
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .with_context(|| format!("failed to add directory entry {name}"))?;
        } else {
            writer
                .start_file(name.as_str(), options)
                .with_context(|| format!("failed to start archive entry {name}"))?;
            let mut source = File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?;
            io::copy(&mut source, &mut writer)
                .with_context(|| format!("failed to write archive entry {name}"))?;
        }
        entries += 1;
    }

    writer.finish().context("failed to finalize archive")?;
    debug!(archive = %archive_path.display(), entries, "archive written");
    Ok(())
}

// Zip entry names always use forward slashes, whatever the host separator.
fn entry_name(relative: &Path) -> String {
    relative
        .iter()
        .map(|component| component.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
