//! Matching references to candidate replacement files.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::library::{FileLister, Library};

/// How a reference name is compared against candidate base names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// An exact base-name hit wins outright; otherwise fall back to prefix.
    /// Lets `WallTypeA` coexist with `WallTypeA_v2` in one library.
    ExactThenPrefix,
    /// Every candidate whose base name starts with the name counts.
    Prefix,
}

/// Outcome of resolving one reference name. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Two or more candidates matched; the engine never picks one.
    Ambiguous(Vec<PathBuf>),
    /// No candidate matched.
    NotFound,
    /// Exactly one candidate matched.
    Unique(PathBuf),
}

impl Resolution {
    /// Classify a list of matching paths.
    pub fn from_matches(mut matches: Vec<PathBuf>) -> Self {
        match matches.len() {
            0 => Self::NotFound,
            1 => matches.pop().map_or(Self::NotFound, Self::Unique),
            _ => Self::Ambiguous(matches),
        }
    }

    /// The matched path, if resolution was unique.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Unique(path) => Some(path),
            Self::Ambiguous(_) | Self::NotFound => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambiguous(_) => f.write_str("ambiguous"),
            Self::NotFound => f.write_str("not found"),
            Self::Unique(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Library {
    /// Resolve a reference name against this library.
    pub fn resolve(&self, name: &str, mode: MatchMode) -> Resolution {
        if mode == MatchMode::ExactThenPrefix {
            let exact = self.exact(name);
            if !exact.is_empty() {
                return Resolution::from_matches(exact.iter().map(|c| c.path.clone()).collect());
            }
        }
        Resolution::from_matches(self.with_prefix(name).map(|c| c.path.clone()).collect())
    }
}

/// Find the unique file in `directories` whose base name starts with `name`.
///
/// Each directory is listed without recursion; matches are counted across all
/// directories combined. A directory that cannot be listed contributes no
/// matches. Comparison is case-sensitive, exactly as the file system reports
/// the names.
pub fn resolve(lister: &dyn FileLister, name: &str, directories: &[PathBuf], extension: &str) -> Resolution {
    let library = Library::build(lister, directories, extension);
    library.resolve(name, MatchMode::Prefix)
}

/// Render the message recorded for a reference that matched several files.
pub fn ambiguity_message(name: &str, candidates: &[PathBuf]) -> String {
    let mut message = format!("Found multiple matches for {name}");
    for path in candidates {
        message.push_str("\n...");
        message.push_str(&path.display().to_string());
    }
    message
}
