//! Content type annotation of finished results.

use std::path::Path;

use filetask_core::CopyEntry;

/// Maps a path to a content type string.
///
/// Only used to annotate results after a batch; never affects what the batch
/// does.
pub trait MimeLookup: Send + Sync {
    fn mime_type(&self, path: &Path) -> Option<String>;
}

/// Guesses content types from file extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMime;

impl MimeLookup for GuessMime {
    fn mime_type(&self, path: &Path) -> Option<String> {
        mime_guess::from_path(path).first_raw().map(str::to_string)
    }
}

/// Leaves every result without a content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMime;

impl MimeLookup for NoMime {
    fn mime_type(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Fill in `mime_type` for each entry, keyed on its source path.
pub fn enrich(entries: &mut [CopyEntry], lookup: &dyn MimeLookup) {
    for entry in entries {
        entry.mime_type = lookup.mime_type(&entry.source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_from_extension() {
        assert_eq!(
            GuessMime.mime_type(Path::new("/tmp/photo.png")).as_deref(),
            Some("image/png")
        );
        assert_eq!(GuessMime.mime_type(Path::new("/tmp/no_extension")), None);
    }

    #[test]
    fn test_enrich() {
        let mut entries = vec![
            CopyEntry::new("/dst/a.txt", "/src/a.txt"),
            CopyEntry::new("/dst/dir", "/src/dir"),
        ];
        enrich(&mut entries, &GuessMime);

        assert_eq!(entries[0].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(entries[1].mime_type, None);

        enrich(&mut entries, &NoMime);
        assert!(entries.iter().all(|e| e.mime_type.is_none()));
    }
}
