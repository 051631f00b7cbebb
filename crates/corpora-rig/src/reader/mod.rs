//! Document readers for the supported source formats.
//!
//! A [`DocumentReader`] turns a single file into zero or more documents.
//! [`load_files`] reads an explicit list of paths in order; [`load_dir`]
//! walks a directory in filename order and dispatches each file to the
//! first reader claiming its extension, skipping files no reader handles.

mod image;
mod pdf;

use std::path::Path;

pub use self::image::ImageReader;
pub use self::pdf::PdfReader;
use crate::{Error, Result, TRACING_TARGET};
use corpora_core::Document;

/// Reads documents from files of a particular format.
pub trait DocumentReader: Send + Sync {
    /// Lowercase file extensions this reader handles, without the dot.
    fn extensions(&self) -> &[&str];

    /// Reads all documents from the given file.
    fn read(&self, path: &Path) -> Result<Vec<Document>>;
}

/// Loads documents from an explicit list of files, preserving input order.
///
/// Every path must be claimed by one of the readers; a path no reader
/// handles, or a file a reader fails on, fails the whole load.
pub fn load_files<P>(paths: &[P], readers: &[&dyn DocumentReader]) -> Result<Vec<Document>>
where
    P: AsRef<Path>,
{
    let mut documents = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let reader = readers
            .iter()
            .find(|r| r.extensions().contains(&extension.as_str()))
            .ok_or_else(|| Error::read(path.display(), "no reader handles this file type"))?;

        let mut read = reader.read(path)?;
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            count = %read.len(),
            "Read documents from file"
        );
        documents.append(&mut read);
    }

    Ok(documents)
}

/// Loads documents from every supported file in a directory.
///
/// Files are visited in ascending filename order so repeated runs yield
/// documents in a stable order. Subdirectories and files without a
/// matching reader are skipped.
pub fn load_dir(dir: impl AsRef<Path>, readers: &[&dyn DocumentReader]) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let supported: Vec<_> = paths
        .into_iter()
        .filter(|path| {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();
            let matched = readers
                .iter()
                .any(|r| r.extensions().contains(&extension.as_str()));
            if !matched {
                tracing::debug!(
                    target: TRACING_TARGET,
                    path = %path.display(),
                    "No reader for file, skipping"
                );
            }
            matched
        })
        .collect();

    let documents = load_files(&supported, readers)?;
    tracing::info!(
        target: TRACING_TARGET,
        dir = %dir.display(),
        count = %documents.len(),
        "Loaded documents"
    );

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubReader;

    impl DocumentReader for StubReader {
        fn extensions(&self) -> &[&str] {
            &["txt"]
        }

        fn read(&self, path: &Path) -> Result<Vec<Document>> {
            let content = std::fs::read_to_string(path)?;
            Ok(vec![Document::text(content).with_source(path)])
        }
    }

    #[test]
    fn load_dir_visits_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "second").unwrap();
        std::fs::write(dir.path().join("a.txt"), "first").unwrap();
        std::fs::write(dir.path().join("c.bin"), "ignored").unwrap();

        let documents = load_dir(dir.path(), &[&StubReader]).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].as_text(), Some("first"));
        assert_eq!(documents[1].as_text(), Some("second"));
    }

    #[test]
    fn load_dir_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let documents = load_dir(dir.path(), &[&StubReader]).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn load_files_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("z.txt");
        let second = dir.path().join("a.txt");
        std::fs::write(&first, "one").unwrap();
        std::fs::write(&second, "two").unwrap();

        let documents = load_files(&[first, second], &[&StubReader]).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].as_text(), Some("one"));
        assert_eq!(documents[1].as_text(), Some("two"));
    }

    #[test]
    fn load_files_fails_on_unhandled_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, "raw").unwrap();

        let error = load_files(&[path], &[&StubReader]).unwrap_err();
        assert!(matches!(error, Error::Read { .. }));
    }

    #[test]
    fn load_dir_matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NOTES.TXT"), "upper").unwrap();

        let documents = load_dir(dir.path(), &[&StubReader]).unwrap();
        assert_eq!(documents.len(), 1);
    }
}
