use std::sync::Arc;

use ethers::types::{Address, H256, U256};

use crate::{
    contracts::CredentialLedger,
    error::VerificationError,
    storage::CredentialStorage,
    types::output::{CredentialMetadata, CredentialRecord},
    utils::metadata_hash,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid {
        record: CredentialRecord,
        metadata: CredentialMetadata,
    },
    Revoked {
        record: CredentialRecord,
        metadata: CredentialMetadata,
    },
    /// the pinned metadata no longer matches what was anchored
    HashMismatch { expected: H256, actual: H256 },
    /// the metadata points at a different file than the record
    FileMismatch { expected: String, actual: String },
    NotFound,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid { .. })
    }
}

/// Checks an anchored credential against its pinned metadata document.
pub struct CredentialVerifier {
    storage: Arc<dyn CredentialStorage>,
    ledger: Arc<dyn CredentialLedger>,
}

impl CredentialVerifier {
    pub fn new(storage: Arc<dyn CredentialStorage>, ledger: Arc<dyn CredentialLedger>) -> Self {
        Self { storage, ledger }
    }

    pub async fn verify_by_id(
        &self,
        credential_id: U256,
    ) -> Result<VerificationOutcome, VerificationError> {
        let Some(record) = self.ledger.get_credential(credential_id).await? else {
            log::info!("credential {credential_id} not found");
            return Ok(VerificationOutcome::NotFound);
        };

        self.check_record(record).await
    }

    /// Look up a credential by the hash of its metadata document.
    pub async fn verify_by_hash(
        &self,
        content_hash: H256,
    ) -> Result<VerificationOutcome, VerificationError> {
        match self.ledger.verify_credential(content_hash).await? {
            Some(credential_id) => self.verify_by_id(credential_id).await,
            None => Ok(VerificationOutcome::NotFound),
        }
    }

    pub async fn credentials_of(&self, subject: Address) -> Result<Vec<U256>, VerificationError> {
        Ok(self.ledger.credentials_of(subject).await?)
    }

    async fn check_record(
        &self,
        record: CredentialRecord,
    ) -> Result<VerificationOutcome, VerificationError> {
        let bytes = self.storage.fetch(&record.metadata_hash).await?;

        // hash exactly what was fetched, before anything is parsed
        let actual = metadata_hash(&bytes);
        if actual != record.content_hash {
            log::warn!(
                "credential {} metadata hash mismatch",
                record.credential_id
            );
            return Ok(VerificationOutcome::HashMismatch {
                expected: record.content_hash,
                actual,
            });
        }

        let metadata: CredentialMetadata = serde_json::from_slice(&bytes)?;

        if metadata.file_hash != record.file_hash {
            return Ok(VerificationOutcome::FileMismatch {
                expected: record.file_hash,
                actual: metadata.file_hash,
            });
        }

        if record.revoked {
            return Ok(VerificationOutcome::Revoked { record, metadata });
        }

        Ok(VerificationOutcome::Valid { record, metadata })
    }
}
