use std::path::{Path, PathBuf};

use regex::Regex;

use crate::engine::{NameTransform, ReloadOptions};
use crate::error::Error;
use crate::library::FsLister;
use crate::types::ReferenceKind;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = ".linkreload.toml";

/// Project configuration loaded from `.linkreload.toml`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Delete child types introduced by reloads at the end of a pass.
    pub delete_new_types: bool,
    /// Per-kind extension overrides.
    pub extensions: Extensions,
    /// Descend into subdirectories of each library directory.
    pub include_subdirectories: bool,
    /// Directories holding candidate files.
    pub library: Vec<PathBuf>,
    /// Regex whose matches are removed from names before matching,
    /// e.g. `-Rev\d+$` to drop a revision suffix.
    pub name_pattern: Option<String>,
}

/// Candidate extensions (without dot). Unset entries use the kind's default.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Extensions {
    /// Extension for CAD link candidates.
    pub cad: Option<String>,
    /// Extension for family candidates.
    pub family: Option<String>,
    /// Extension for model link candidates.
    pub model: Option<String>,
}

/// Raw TOML structure for `.linkreload.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkreloadTomlConfig {
    #[serde(default = "default_delete_new_types")]
    delete_new_types: bool,
    #[serde(default)]
    extensions: Extensions,
    #[serde(default)]
    include_subdirectories: bool,
    #[serde(default)]
    library: Vec<PathBuf>,
    #[serde(default)]
    name_pattern: Option<String>,
}

/// New types are cleaned up unless the config says otherwise.
const fn default_delete_new_types() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delete_new_types: default_delete_new_types(),
            extensions: Extensions::default(),
            include_subdirectories: false,
            library: Vec::new(),
            name_pattern: None,
        }
    }
}

impl Config {
    /// Load config from `.linkreload.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. A file that exists but is
    /// malformed is an error, never silently replaced by defaults.
    /// Relative library directories are taken relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(path = %path.display(), "found config file");
        let config = Self::parse(&content)?;
        Ok(config.rooted_at(root))
    }

    /// Parse config content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: LinkreloadTomlConfig = toml::from_str(content)?;
        Ok(Self {
            delete_new_types: raw.delete_new_types,
            extensions: raw.extensions,
            include_subdirectories: raw.include_subdirectories,
            library: raw.library,
            name_pattern: raw.name_pattern,
        })
    }

    /// Candidate extension for `kind`.
    pub fn extension(&self, kind: ReferenceKind) -> &str {
        let configured = match kind {
            ReferenceKind::CadLink => &self.extensions.cad,
            ReferenceKind::Family => &self.extensions.family,
            ReferenceKind::ModelLink => &self.extensions.model,
        };
        configured
            .as_deref()
            .map_or(kind.default_extension(), |e| e.trim_start_matches('.'))
    }

    /// File lister matching the configured recursion.
    pub const fn lister(&self) -> FsLister {
        FsLister { include_subdirectories: self.include_subdirectories }
    }

    /// Name normalization built from `name_pattern`: identity when unset,
    /// otherwise every match is removed and surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidNamePattern` if the pattern does not compile.
    pub fn name_transform(&self) -> Result<NameTransform, Error> {
        let Some(pattern) = &self.name_pattern else {
            return Ok(Box::new(str::to_string));
        };
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidNamePattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Box::new(move |name: &str| regex.replace_all(name, "").trim().to_string()))
    }

    /// Reload options for `kind` from this config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidNamePattern` if `name_pattern` does not compile.
    pub fn reload_options(&self, kind: ReferenceKind) -> Result<ReloadOptions, Error> {
        let mut options = ReloadOptions::new(kind);
        options.delete_new_types = self.delete_new_types;
        options.normalize_name = self.name_transform()?;
        Ok(options)
    }

    /// Resolve relative library directories against `root`.
    fn rooted_at(mut self, root: &Path) -> Self {
        self.library = self
            .library
            .into_iter()
            .map(|dir| if dir.is_absolute() { dir } else { root.join(dir) })
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.library.is_empty());
        assert!(config.delete_new_types);
        assert_eq!(config.extension(ReferenceKind::Family), "rfa");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "library = 3").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("libary = []").is_err());
    }

    #[test]
    fn library_is_rooted_and_extensions_overridden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "library = [\"families\"]\n\
             delete_new_types = false\n\
             [extensions]\n\
             cad = \".DXF\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.library, vec![dir.path().join("families")]);
        assert!(!config.delete_new_types);
        assert_eq!(config.extension(ReferenceKind::CadLink), "DXF");
        assert_eq!(config.extension(ReferenceKind::ModelLink), "rvt");
    }

    #[test]
    fn name_pattern_strips_revision() {
        let config = Config::parse("name_pattern = '-Rev\\d+$'").unwrap();
        let transform = config.name_transform().unwrap();
        assert_eq!(transform("Grid-Rev3"), "Grid");
        assert_eq!(transform("Grid"), "Grid");
    }

    #[test]
    fn no_pattern_is_identity() {
        let transform = Config::default().name_transform().unwrap();
        assert_eq!(transform("Grid-Rev3"), "Grid-Rev3");
    }

    #[test]
    fn bad_pattern_is_reported() {
        let config = Config::parse("name_pattern = '('").unwrap();
        assert!(matches!(
            config.name_transform(),
            Err(Error::InvalidNamePattern { .. })
        ));
    }

    #[test]
    fn reload_options_follow_config() {
        let config = Config::parse("delete_new_types = false").unwrap();
        let options = config.reload_options(ReferenceKind::ModelLink).unwrap();
        assert!(!options.delete_new_types);
        assert_eq!(options.kind, ReferenceKind::ModelLink);
    }
}
