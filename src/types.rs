/// Core domain types for external references and host load results.
use std::collections::BTreeSet;
use std::fmt;

use crate::resolver::MatchMode;

/// Document-local element identity. Opaque to the engine apart from
/// equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(
    /// Raw integer value assigned by the host.
    pub i64,
);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

/// The three kinds of externally referenced resources a document can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum ReferenceKind {
    /// A CAD drawing link. Has no child types.
    #[value(name = "cad")]
    CadLink,
    /// An embedded family definition with its types (symbols).
    Family,
    /// A model-to-model link with its link types.
    #[value(name = "model")]
    ModelLink,
}

impl ReferenceKind {
    /// Extension (without dot) of candidate files for this kind.
    pub const fn default_extension(self) -> &'static str {
        return match self {
            Self::CadLink => "dwg",
            Self::Family => "rfa",
            Self::ModelLink => "rvt",
        };
    }

    /// Families are matched on their full name first; links by prefix only.
    pub const fn default_match_mode(self) -> MatchMode {
        return match self {
            Self::Family => MatchMode::ExactThenPrefix,
            Self::CadLink | Self::ModelLink => MatchMode::Prefix,
        };
    }

    /// Human label used in log lines and outcome messages.
    pub const fn label(self) -> &'static str {
        return match self {
            Self::CadLink => "CAD link",
            Self::Family => "family",
            Self::ModelLink => "model link",
        };
    }

    /// Whether reloading can attach new child types that need reconciling.
    pub const fn tracks_child_types(self) -> bool {
        return matches!(self, Self::Family | Self::ModelLink);
    }
}

/// One embedded or linked resource inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
    /// Child type ids as seen when the reference was discovered. The engine
    /// re-reads them around each reload rather than trusting this snapshot.
    pub child_type_ids: BTreeSet<ElementId>,
    /// Document-local identity.
    pub id: ElementId,
    /// Resource kind.
    pub kind: ReferenceKind,
    /// Display name, used for candidate matching.
    pub name: String,
}

/// Load-result code returned by the host's native reload. Kept verbatim:
/// several codes (e.g. a more recent version already loaded) are
/// informational rather than failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLoadResult {
    /// Code as reported by the host.
    pub code: String,
}

impl NativeLoadResult {
    /// Wrap a host load-result code.
    pub fn new(code: impl Into<String>) -> Self {
        return Self { code: code.into() };
    }
}

impl fmt::Display for NativeLoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.code);
    }
}

/// Which worksets a reloaded model link opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksetOption {
    /// Close every workset of the linked model.
    CloseAll,
    /// Open every workset of the linked model.
    OpenAll,
    /// Open the worksets that were open when the link was last viewed.
    OpenLastViewed,
}

/// Configuration handed to the host's reload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadConfig {
    /// Reuse whatever configuration the reference was previously loaded with.
    #[default]
    ReusePrevious,
    /// Reload with an explicit workset configuration.
    Worksets(WorksetOption),
}
