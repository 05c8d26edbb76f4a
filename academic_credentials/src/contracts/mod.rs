pub mod credential_registry;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, H256, U256};

use crate::{
    error::LedgerError,
    types::output::{CredentialRecord, IssuanceReceipt, IssuanceRequest},
};

/// The credential registry contract as seen by the workflows. Sending a
/// transaction and waiting on it are separate calls so the caller can report
/// progress in between.
#[async_trait]
pub trait CredentialLedger: Send + Sync {
    async fn submit_issuance(&self, request: IssuanceRequest) -> Result<TxHash, LedgerError>;

    async fn wait_for_confirmation(&self, tx_hash: TxHash)
        -> Result<IssuanceReceipt, LedgerError>;

    async fn get_credential(
        &self,
        credential_id: U256,
    ) -> Result<Option<CredentialRecord>, LedgerError>;

    /// id of the credential anchored under `content_hash`, if any
    async fn verify_credential(&self, content_hash: H256) -> Result<Option<U256>, LedgerError>;

    async fn credentials_of(&self, subject: Address) -> Result<Vec<U256>, LedgerError>;

    /// Revoke a credential previously issued by the connected account.
    async fn revoke_credential(&self, credential_id: U256) -> Result<TxHash, LedgerError>;
}
