use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    abi::RawLog,
    contract::{abigen, ContractError, EthEvent},
    providers::{Middleware, PendingTransaction},
    types::{Address, TransactionReceipt, TxHash, H256, U256, U64},
};

use crate::{
    config::ContractNetworkConfig,
    contracts::CredentialLedger,
    error::LedgerError,
    types::output::{CredentialRecord, IssuanceReceipt, IssuanceRequest},
};

abigen!(
    CredentialRegistry,
    r#"[
        function issueCredential(address student, bytes32 credentialHash, string ipfsHash, string metadataHash) external returns (uint256)
        function revokeCredential(uint256 credentialId) external
        function getCredential(uint256 credentialId) external view returns (address, address, bytes32, string, string, uint256, bool)
        function verifyCredential(bytes32 credentialHash) external view returns (bool, uint256)
        function getStudentCredentials(address student) external view returns (uint256[])
        event CredentialIssued(uint256 indexed credentialId, address indexed student, address indexed issuer, bytes32 credentialHash)
    ]"#
);

pub struct EthersCredentialLedger<S> {
    contract_address: Address,
    client: Arc<S>,
    confirmations: usize,
}

impl<S> EthersCredentialLedger<S>
where
    S: Middleware + 'static,
{
    pub fn new(
        client: Arc<S>,
        config: &ContractNetworkConfig,
        confirmations: usize,
    ) -> Result<Self, LedgerError> {
        let contract_address = config
            .contract_address
            .parse()
            .map_err(|_| LedgerError::InvalidAddress(config.contract_address.clone()))?;

        Ok(Self {
            contract_address,
            client,
            confirmations,
        })
    }

    fn contract(&self) -> CredentialRegistry<S> {
        CredentialRegistry::new(self.contract_address, self.client.clone())
    }
}

fn ledger_error<M: Middleware>(e: ContractError<M>) -> LedgerError {
    if e.is_revert() {
        LedgerError::Reverted(e.to_string())
    } else {
        LedgerError::Rejected(e.to_string())
    }
}

/// Only an explicit status 0 is a failure. Pre-byzantium receipts carry no
/// status at all.
fn check_receipt_status(receipt: &TransactionReceipt) -> Result<(), LedgerError> {
    if receipt.status == Some(U64::zero()) {
        return Err(LedgerError::Reverted(format!(
            "transaction {:?} failed in block {:?}",
            receipt.transaction_hash, receipt.block_number
        )));
    }
    Ok(())
}

#[async_trait]
impl<S> CredentialLedger for EthersCredentialLedger<S>
where
    S: Middleware + 'static,
{
    async fn submit_issuance(&self, request: IssuanceRequest) -> Result<TxHash, LedgerError> {
        let contract = self.contract();

        let mut call = contract.issue_credential(
            request.subject,
            request.content_hash.to_fixed_bytes(),
            request.file_hash,
            request.metadata_hash,
        );
        if let Some(gas) = request.options.gas_limit {
            call = call.gas(gas);
        }

        let pending = call.send().await.map_err(ledger_error)?;
        let tx_hash = pending.tx_hash();
        log::info!("issuance transaction sent: {tx_hash:?}");

        Ok(tx_hash)
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> Result<IssuanceReceipt, LedgerError> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .confirmations(self.confirmations)
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))?
            .ok_or(LedgerError::Dropped(tx_hash))?;

        check_receipt_status(&receipt)?;

        let block_number = receipt.block_number.map(|b| b.as_u64());
        let credential_id = receipt.logs.into_iter().find_map(|log| {
            CredentialIssuedFilter::decode_log(&RawLog::from(log))
                .ok()
                .map(|event| event.credential_id)
        });

        Ok(IssuanceReceipt {
            tx_hash,
            block_number,
            credential_id,
        })
    }

    async fn get_credential(
        &self,
        credential_id: U256,
    ) -> Result<Option<CredentialRecord>, LedgerError> {
        let res = self.contract().get_credential(credential_id).call().await;

        let (subject, issuer, content_hash, file_hash, metadata_hash, issued_at, revoked) =
            match res {
                Ok(record) => record,
                // the registry reverts on unknown ids
                Err(e) if e.is_revert() => return Ok(None),
                Err(e) => return Err(LedgerError::Provider(e.to_string())),
            };

        if subject == Address::zero() {
            return Ok(None);
        }

        Ok(Some(CredentialRecord {
            credential_id,
            subject,
            issuer,
            content_hash: H256::from(content_hash),
            file_hash,
            metadata_hash,
            issued_at: issued_at.as_u64(),
            revoked,
        }))
    }

    async fn verify_credential(&self, content_hash: H256) -> Result<Option<U256>, LedgerError> {
        let (valid, credential_id) = self
            .contract()
            .verify_credential(content_hash.to_fixed_bytes())
            .call()
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))?;

        Ok(valid.then_some(credential_id))
    }

    async fn credentials_of(&self, subject: Address) -> Result<Vec<U256>, LedgerError> {
        self.contract()
            .get_student_credentials(subject)
            .call()
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))
    }

    async fn revoke_credential(&self, credential_id: U256) -> Result<TxHash, LedgerError> {
        let contract = self.contract();
        let call = contract.revoke_credential(credential_id);
        let pending = call.send().await.map_err(ledger_error)?;
        let tx_hash = pending.tx_hash();
        log::info!("revocation of credential {credential_id} sent: {tx_hash:?}");

        Ok(tx_hash)
    }
}
