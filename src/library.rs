use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;

/// A file in a library directory that might replace a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// File name without extension; the key used for matching.
    pub base_name: String,
    /// Directory the file was found in.
    pub directory: PathBuf,
    /// Full path to the file.
    pub path: PathBuf,
}

impl CandidateFile {
    /// Split a listed path into its matching key and directory.
    /// Returns `None` for paths without a UTF-8 file stem.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let base_name = path.file_stem()?.to_str()?.to_string();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        return Some(Self {
            base_name,
            directory,
            path,
        });
    }
}

/// Enumerates candidate files. The engine never touches the file system
/// directly, so tests can supply an in-memory listing.
pub trait FileLister {
    /// Files in `directory` whose extension equals `extension` (no dot,
    /// ASCII case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryUnreadable` if the directory cannot be walked.
    fn list_files(&self, directory: &Path, extension: &str) -> Result<Vec<PathBuf>, Error>;
}

/// Lists files from disk with `walkdir`, following symbolic links.
///
/// Only a directory that cannot be opened at all is an error. An entry below
/// it that cannot be read (a dangling link, a locked subfolder) is logged and
/// skipped; the rest of the directory still counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister {
    /// Descend into subdirectories instead of listing only the top level.
    pub include_subdirectories: bool,
}

impl FileLister for FsLister {
    fn list_files(&self, directory: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
        let mut walker = WalkDir::new(directory)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        if !self.include_subdirectories {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(Error::DirectoryUnreadable {
                        directory: directory.to_path_buf(),
                        reason: e.to_string(),
                    });
                },
                Err(e) => {
                    tracing::warn!(directory = %directory.display(), error = %e, "skipping unreadable entry");
                    continue;
                },
            };
            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Compare a path's extension against `extension`, ignoring ASCII case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Candidate files for one pass, keyed by full base name.
///
/// Built once per pass. Exact lookups are a map probe; prefix lookups walk
/// the ordered key range starting at the prefix.
#[derive(Debug, Clone, Default)]
pub struct Library {
    /// Candidates grouped by base name, each group in discovery order.
    by_name: BTreeMap<String, Vec<CandidateFile>>,
}

impl Library {
    /// List every directory and group the files by base name.
    /// A directory that cannot be listed is logged and skipped so one broken
    /// share does not empty the whole library.
    pub fn build(lister: &dyn FileLister, directories: &[PathBuf], extension: &str) -> Self {
        let mut library = Self::default();
        for directory in directories {
            match lister.list_files(directory, extension) {
                Ok(paths) => library.extend(paths),
                Err(e) => {
                    tracing::warn!(directory = %directory.display(), error = %e, "skipping library directory");
                },
            }
        }
        tracing::debug!(candidates = library.len(), extension, "built library");
        library
    }

    /// Build directly from a list of paths.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut library = Self::default();
        library.extend(paths);
        library
    }

    /// Candidates whose base name equals `name` exactly.
    pub fn exact(&self, name: &str) -> &[CandidateFile] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Add paths to the library.
    fn extend(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for candidate in paths.into_iter().filter_map(CandidateFile::from_path) {
            self.by_name
                .entry(candidate.base_name.clone())
                .or_default()
                .push(candidate);
        }
    }

    /// Whether no candidate was found at all.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate every candidate in base-name order.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateFile> {
        self.by_name.values().flatten()
    }

    /// Total number of candidate files, counting same-named files separately.
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Number of distinct base names.
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    /// Candidates whose base name starts with `prefix` (case-sensitive).
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a CandidateFile> + 'a {
        self.by_name
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .flat_map(|(_, candidates)| candidates.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_same_name_across_directories() {
        let library = Library::from_paths([
            PathBuf::from("a/Door.rfa"),
            PathBuf::from("b/Door.rfa"),
            PathBuf::from("a/Window.rfa"),
        ]);
        assert_eq!(library.len(), 3);
        assert_eq!(library.name_count(), 2);
        assert_eq!(library.exact("Door").len(), 2);
        assert_eq!(library.exact("Door")[1].directory, PathBuf::from("b"));
    }

    #[test]
    fn prefix_range_stops_at_first_non_match() {
        let library = Library::from_paths([
            PathBuf::from("lib/Grid-A.rfa"),
            PathBuf::from("lib/Grid-B.rfa"),
            PathBuf::from("lib/GridLine.rfa"),
            PathBuf::from("lib/Gutter.rfa"),
            PathBuf::from("lib/Afoo.rfa"),
        ]);
        let names: Vec<&str> = library.with_prefix("Grid-").map(|c| c.base_name.as_str()).collect();
        assert_eq!(names, ["Grid-A", "Grid-B"]);
        assert_eq!(library.with_prefix("Grid").count(), 3);
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let library = Library::from_paths([PathBuf::from("lib/walltype.rfa")]);
        assert_eq!(library.with_prefix("WallType").count(), 0);
        assert_eq!(library.with_prefix("wall").count(), 1);
    }

    #[test]
    fn extension_compare_ignores_ascii_case() {
        assert!(has_extension(Path::new("x/Door.RFA"), "rfa"));
        assert!(has_extension(Path::new("x/Door.rfa"), ".rfa"));
        assert!(!has_extension(Path::new("x/Door.rvt"), "rfa"));
        assert!(!has_extension(Path::new("x/Door"), "rfa"));
    }

    #[test]
    fn fs_lister_respects_depth() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Top.rfa"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("Nested.rfa"), "").unwrap();

        let flat = FsLister { include_subdirectories: false }
            .list_files(dir.path(), "rfa")
            .unwrap();
        assert_eq!(flat, vec![dir.path().join("Top.rfa")]);

        let deep = FsLister { include_subdirectories: true }
            .list_files(dir.path(), "rfa")
            .unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn build_skips_unreadable_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Door.rfa"), "").unwrap();
        let missing = dir.path().join("missing");

        let library = Library::build(
            &FsLister::default(),
            &[missing, dir.path().to_path_buf()],
            "rfa",
        );
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn fs_lister_reports_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            FsLister::default().list_files(&missing, "rfa"),
            Err(Error::DirectoryUnreadable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_keeps_rest_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Door.rfa"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("Window.rfa"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.rfa"), dir.path().join("Broken.rfa")).unwrap();

        for include_subdirectories in [false, true] {
            let lister = FsLister { include_subdirectories };
            let library = Library::build(&lister, &[dir.path().to_path_buf()], "rfa");
            assert_eq!(library.exact("Door").len(), 1);
            assert!(library.exact("Broken").is_empty());
            assert_eq!(library.exact("Window").len(), usize::from(include_subdirectories));
        }
    }
}
