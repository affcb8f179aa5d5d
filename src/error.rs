use thiserror::Error;

/// Main error type for nagl-models
#[derive(Error, Debug)]
pub enum NaglModelsError {
    #[error("'{0}' does not look like a model file (expected a '.pt' extension)")]
    BadFileSuffix(String),

    #[error("Hash mismatch for '{filename}': expected {expected}, computed {computed}")]
    HashMismatch {
        filename: String,
        expected: String,
        computed: String,
    },

    #[error("Could not parse '{0}' as a Zenodo DOI\n\nTroubleshooting:\n- Expected '10.5281/zenodo.<record>' (production) or '10.5072/zenodo.<record>' (sandbox)\n- Pass the bare DOI, not a https://doi.org/ URL")]
    UnableToParseDoi(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Release tag '{tag}' is not a valid version: {source}")]
    BadReleaseTag {
        tag: String,
        #[source]
        source: semver::Error,
    },

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/nagl-models/config.toml\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Network error: {0}\n\nTroubleshooting:\n- Check internet connection\n- The release feed and Zenodo rate limit anonymous clients; try again in a moment")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NaglModelsError>;
