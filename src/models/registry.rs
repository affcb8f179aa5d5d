/// An officially released model artifact and its content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownModel {
    pub filename: &'static str,
    pub model_type: &'static str,
    pub sha256: &'static str,
}

/// File extension every model artifact must carry
pub const MODEL_SUFFIX: &str = ".pt";

/// Registry of officially released artifacts, keyed by filename
pub const KNOWN_MODELS: &[KnownModel] = &[
    KnownModel {
        filename: "openff-gnn-am1bcc-0.0.1-alpha.1.pt",
        model_type: "am1bcc",
        sha256: "a0fcf53feab7182ea53aecec994bb6dba0833b0468a59392551c817cb7acb51a",
    },
    KnownModel {
        filename: "openff-gnn-am1bcc-0.1.0-rc.1.pt",
        model_type: "am1bcc",
        sha256: "ee2dd8123f4b231d5de26bd63f47be94332a99d58095945a68e81b2efdcdfceb",
    },
    KnownModel {
        filename: "openff-gnn-am1bcc-0.1.0-rc.2.pt",
        model_type: "am1bcc",
        sha256: "648b2636580f49f882591aedcc5c404a9cbbecb9ca1e082d98ccd71301db917f",
    },
    KnownModel {
        filename: "openff-gnn-am1bcc-0.1.0-rc.3.pt",
        model_type: "am1bcc",
        sha256: "144ed56e46c5b3ad80157b342c8c0f8f7340e4d382a678e30dd300c811646bd0",
    },
];

impl KnownModel {
    /// Find a released artifact by filename
    #[must_use]
    pub fn find(filename: &str) -> Option<&'static Self> {
        KNOWN_MODELS.iter().find(|m| m.filename == filename)
    }

    /// Get all released artifact filenames
    #[must_use]
    pub fn all_filenames() -> Vec<&'static str> {
        KNOWN_MODELS.iter().map(|m| m.filename).collect()
    }
}

/// Expected content hash for an officially released filename, if any
#[must_use]
pub fn known_hash(filename: &str) -> Option<&'static str> {
    KnownModel::find(filename).map(|m| m.sha256)
}

/// Whether a filename carries the recognized model suffix with a non-empty stem
#[must_use]
pub fn has_model_suffix(filename: &str) -> bool {
    filename
        .strip_suffix(MODEL_SUFFIX)
        .is_some_and(|stem| !stem.is_empty())
}
