use std::{fmt, io, path::Path, str::FromStr};

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::{types::output::UploadResult, utils::media_type_for_path};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialCategory {
    #[default]
    Degree,
    Certificate,
    Diploma,
}

impl fmt::Display for CredentialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialCategory::Degree => "degree",
            CredentialCategory::Certificate => "certificate",
            CredentialCategory::Diploma => "diploma",
        };
        f.write_str(name)
    }
}

impl FromStr for CredentialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degree" => Ok(CredentialCategory::Degree),
            "certificate" => Ok(CredentialCategory::Certificate),
            "diploma" => Ok(CredentialCategory::Diploma),
            other => Err(format!("unknown credential type '{other}'")),
        }
    }
}

/// A file picked for upload, before it has been validated.
#[derive(Clone, Debug, PartialEq)]
pub struct FileInput {
    pub file_name: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

impl FileInput {
    /// Read a file from disk, guessing its media type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            file_name,
            media_type: media_type_for_path(path).to_owned(),
            content,
        })
    }
}

/// State of the two-step issuance wizard. Step one fills `file`, step two
/// submits the rest of the fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CredentialForm {
    pub subject_name: String,
    pub subject_address: String,
    pub category: CredentialCategory,
    pub institution_name: String,
    pub description: Option<String>,
    pub file: Option<UploadResult>,
}

impl CredentialForm {
    /// content hash of the uploaded file, if step one completed
    pub fn file_hash(&self) -> Option<&str> {
        self.file
            .as_ref()
            .map(|f| f.hash.as_str())
            .filter(|h| !h.trim().is_empty())
    }
}

/// Overrides applied to the issuance transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub gas_limit: Option<U256>,
}
