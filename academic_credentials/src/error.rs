//! Errors surfaced by the storage client, the credential ledger and the
//! issuance workflow.

use std::fmt;

use ethers::types::TxHash;
use thiserror::Error;

/// Why a file was refused before upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileRejection {
    #[error("unsupported file type '{0}', expected PNG, JPEG or PDF")]
    UnsupportedType(String),
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("file is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid storage url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("no pinning credentials configured")]
    MissingCredentials,
    #[error("content '{0}' not found")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// the signer refused the transaction, or the node refused to accept it
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("transaction {0:?} was dropped from the mempool")]
    Dropped(TxHash),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid contract address '{0}'")]
    InvalidAddress(String),
}

/// A requirement that must hold before a submission may touch the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    NoUploadedFile,
    NoWalletAccount,
    NoContractClient,
    MissingField(&'static str),
    InvalidSubjectAddress(String),
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NoUploadedFile => write!(f, "upload the credential file first"),
            Precondition::NoWalletAccount => write!(f, "no wallet account connected"),
            Precondition::NoContractClient => write!(f, "contract client is not initialized"),
            Precondition::MissingField(field) => write!(f, "'{field}' is required"),
            Precondition::InvalidSubjectAddress(address) => {
                write!(f, "'{address}' is not a valid address")
            }
        }
    }
}

/// Steps of the issuance wizard, used to name the failing step in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStep {
    ValidateFile,
    UploadFile,
    CheckPreconditions,
    UploadMetadata,
    HashMetadata,
    SubmitTransaction,
    AwaitConfirmation,
}

impl fmt::Display for IssuanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStep::ValidateFile => "file validation",
            IssuanceStep::UploadFile => "file upload",
            IssuanceStep::CheckPreconditions => "submission check",
            IssuanceStep::UploadMetadata => "metadata upload",
            IssuanceStep::HashMetadata => "metadata hashing",
            IssuanceStep::SubmitTransaction => "transaction submission",
            IssuanceStep::AwaitConfirmation => "transaction confirmation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("invalid file: {0}")]
    InvalidFile(#[from] FileRejection),
    #[error("{step} failed: {source}")]
    Storage {
        step: IssuanceStep,
        #[source]
        source: StorageError,
    },
    #[error("cannot submit: {0}")]
    MissingPrecondition(Precondition),
    #[error("failed to serialize credential metadata: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("transaction signature rejected: {0}")]
    SignatureRejected(String),
    #[error("transaction reverted: {0}")]
    Reverted(String),
    #[error("transaction confirmation failed: {0}")]
    ConfirmationFailed(String),
}

impl IssuanceError {
    pub(crate) fn from_ledger(step: IssuanceStep, err: LedgerError) -> Self {
        match (step, err) {
            (_, LedgerError::Reverted(msg)) => IssuanceError::Reverted(msg),
            (IssuanceStep::SubmitTransaction, err) => {
                IssuanceError::SignatureRejected(err.to_string())
            }
            (_, err) => IssuanceError::ConfirmationFailed(err.to_string()),
        }
    }

    /// The wizard step the error belongs to.
    pub fn step(&self) -> IssuanceStep {
        match self {
            IssuanceError::InvalidFile(_) => IssuanceStep::ValidateFile,
            IssuanceError::Storage { step, .. } => *step,
            IssuanceError::MissingPrecondition(_) => IssuanceStep::CheckPreconditions,
            IssuanceError::Serialization(_) => IssuanceStep::HashMetadata,
            IssuanceError::SignatureRejected(_) => IssuanceStep::SubmitTransaction,
            IssuanceError::Reverted(_) => IssuanceStep::SubmitTransaction,
            IssuanceError::ConfirmationFailed(_) => IssuanceStep::AwaitConfirmation,
        }
    }

    /// Text for a transient user-facing notification.
    pub fn notification(&self) -> String {
        format!("Credential issuance stopped at {}: {}", self.step(), self)
    }
}

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("malformed credential metadata: {0}")]
    MalformedMetadata(#[from] serde_json::Error),
}
