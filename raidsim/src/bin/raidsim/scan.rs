// vim: tw=80
//! Build a workload from the media files beneath a directory

use std::path::Path;

use raidsim_core::workload::{FileDescriptor, FileKind};

use super::{Error, Result};

/// Recursively list every supported media file beneath `dir`, in path order.
///
/// Files with unrecognized extensions are silently skipped.
pub(super) fn scan(dir: &Path) -> Result<Vec<FileDescriptor>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_owned()));
    }
    let root = dir.to_str()
        .ok_or_else(|| Error::NonUtf8Path(dir.to_owned()))?;
    let pattern = format!("{}/**/*", glob::Pattern::escape(root));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        let Some(kind) = FileKind::from_path(&path) else {
            continue;
        };
        let md = path.metadata()?;
        if !md.is_file() {
            continue;
        }
        files.push(FileDescriptor::new(path, md.len(), kind));
    }
    files.sort_unstable_by(|x, y| x.path.cmp(&y.path));
    tracing::info!(dir = %dir.display(), files = files.len(), "scanned");
    Ok(files)
}
