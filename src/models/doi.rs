use crate::error::{NaglModelsError, Result};

const SANDBOX_PREFIX: &str = "10.5072";
const PRODUCTION_PREFIX: &str = "10.5281";

const SANDBOX_HOST: &str = "sandbox.zenodo.org";
const PRODUCTION_HOST: &str = "zenodo.org";

/// A parsed Zenodo DOI, e.g. `10.5281/zenodo.278300`.
///
/// The registrant prefix picks the host: `10.5072` is the sandbox, `10.5281`
/// is production. Any other shape is a parse failure, never a guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doi {
    host: &'static str,
    record: String,
}

impl Doi {
    /// Parse a bare DOI string
    pub fn parse(raw: &str) -> Result<Self> {
        let err = || NaglModelsError::UnableToParseDoi(raw.to_string());

        let (prefix, suffix) = raw.split_once('/').ok_or_else(err)?;

        let host = match prefix {
            SANDBOX_PREFIX => SANDBOX_HOST,
            PRODUCTION_PREFIX => PRODUCTION_HOST,
            _ => return Err(err()),
        };

        let record = suffix.strip_prefix("zenodo.").ok_or_else(err)?;
        if record.is_empty() || !record.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        Ok(Self {
            host,
            record: record.to_string(),
        })
    }

    /// Archive host this DOI resolves against
    #[must_use]
    pub fn host(&self) -> &str {
        self.host
    }

    /// Numeric record identifier
    #[must_use]
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Download URL of a named file within this record
    #[must_use]
    pub fn file_url(&self, filename: &str) -> String {
        format!(
            "https://{}/api/records/{}/files/{}",
            self.host, self.record, filename
        )
    }
}
