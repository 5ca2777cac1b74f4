//! Up-front size estimate of a batch.

use std::fs;
use std::path::{Path, PathBuf};

use filetask_core::{OperationError, SizePolicy};
use jwalk::{Parallelism, WalkDir};
use tracing::debug;

/// Sum the sizes of every regular file under `paths`.
///
/// A file contributes its own length, a directory the files strictly below
/// it. Unreadable entries count as zero under [`SizePolicy::Lenient`] and
/// fail the whole estimate under [`SizePolicy::Strict`].
pub fn total_size(paths: &[PathBuf], policy: SizePolicy) -> Result<u64, OperationError> {
    let mut total = 0u64;

    for path in paths {
        let size = match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => dir_size(path, policy)?,
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => 0,
            Err(err) => unreadable(policy, path, OperationError::io(path, err))?,
        };
        total = total.saturating_add(size);
    }

    Ok(total)
}

/// Total size of the regular files below a directory.
fn dir_size(root: &Path, policy: SizePolicy) -> Result<u64, OperationError> {
    let walker = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .min_depth(0);

    let mut total = 0u64;
    for entry_result in walker {
        let mut entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(|p| p.to_path_buf()).unwrap_or_else(|| root.to_path_buf());
                let error = walk_error(&path, &err);
                unreadable(policy, &path, error)?;
                continue;
            }
        };

        if let Some(err) = entry.read_children_error.take() {
            let path = entry.path();
            unreadable(policy, &path, walk_error(&path, &err))?;
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => total = total.saturating_add(metadata.len()),
            Err(err) => {
                let path = entry.path();
                let error = walk_error(&path, &err);
                unreadable(policy, &path, error)?;
            }
        }
    }

    Ok(total)
}

fn walk_error(path: &Path, err: &jwalk::Error) -> OperationError {
    OperationError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(err.to_string()),
    }
}

/// Apply the size policy to an entry that could not be stat'ed.
fn unreadable(policy: SizePolicy, path: &Path, error: OperationError) -> Result<u64, OperationError> {
    match policy {
        SizePolicy::Lenient => {
            debug!(path = %path.display(), %error, "counting unreadable entry as 0 bytes");
            Ok(0)
        }
        SizePolicy::Strict => Err(error),
    }
}
