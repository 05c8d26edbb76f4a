//! In-memory storage and ledger used by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use ethers::types::{Address, TxHash, H256, U256};
use tokio::sync::Notify;

use crate::{
    contracts::CredentialLedger,
    error::{LedgerError, StorageError},
    storage::CredentialStorage,
    types::{
        input::FileInput,
        output::{CredentialRecord, IssuanceReceipt, IssuanceRequest, UploadResult},
    },
    utils::{metadata_hash, PNG_MEDIA_TYPE},
};

pub fn png_file(size: usize) -> FileInput {
    let mut content = b"\x89PNG\r\n\x1a\n".to_vec();
    content.resize(size.max(content.len()), 0);
    FileInput {
        file_name: "diploma.png".to_owned(),
        media_type: PNG_MEDIA_TYPE.to_owned(),
        content,
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn fail_uploads(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Overwrite pinned content, as a tampering gateway would.
    pub fn replace(&self, hash: &str, content: Vec<u8>) {
        self.blobs.lock().unwrap().insert(hash.to_owned(), content);
    }

    fn pin(&self, content: Vec<u8>) -> Result<String, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Status {
                status: 503,
                body: "pinning unavailable".to_owned(),
            });
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let hash = format!("Qm{}", hex::encode(&metadata_hash(&content).as_bytes()[..16]));
        self.blobs.lock().unwrap().insert(hash.clone(), content);
        Ok(hash)
    }
}

#[async_trait]
impl CredentialStorage for MemoryStorage {
    async fn upload_file(&self, file: &FileInput) -> Result<UploadResult, StorageError> {
        let hash = self.pin(file.content.clone())?;
        Ok(UploadResult {
            url: self.url_for(&hash),
            hash,
        })
    }

    async fn upload_json(&self, document: &[u8], _name: &str) -> Result<String, StorageError> {
        self.pin(document.to_vec())
    }

    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(hash.to_owned()))
    }

    fn url_for(&self, hash: &str) -> String {
        format!("memory://ipfs/{hash}")
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    requests: Mutex<Vec<IssuanceRequest>>,
    records: Mutex<Vec<CredentialRecord>>,
    hold: Mutex<Option<Arc<Notify>>>,
    submit_error: Mutex<Option<LedgerError>>,
    drop_confirmations: AtomicBool,
}

impl MemoryLedger {
    pub fn requests(&self) -> Vec<IssuanceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Make submissions wait until the returned handle is notified.
    pub fn hold_submissions(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn fail_submissions(&self, err: LedgerError) {
        *self.submit_error.lock().unwrap() = Some(err);
    }

    pub fn drop_confirmations(&self) {
        self.drop_confirmations.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialLedger for MemoryLedger {
    async fn submit_issuance(&self, request: IssuanceRequest) -> Result<TxHash, LedgerError> {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(err) = self.submit_error.lock().unwrap().clone() {
            return Err(err);
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = requests.len() as u64;

        self.records.lock().unwrap().push(CredentialRecord {
            credential_id: U256::from(id),
            subject: request.subject,
            issuer: Address::from_low_u64_be(1),
            content_hash: request.content_hash,
            file_hash: request.file_hash,
            metadata_hash: request.metadata_hash,
            issued_at: 1_700_000_000 + id,
            revoked: false,
        });

        Ok(H256::from_low_u64_be(id))
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> Result<IssuanceReceipt, LedgerError> {
        if self.drop_confirmations.load(Ordering::SeqCst) {
            return Err(LedgerError::Dropped(tx_hash));
        }
        let id = tx_hash.to_low_u64_be();
        Ok(IssuanceReceipt {
            tx_hash,
            block_number: Some(100 + id),
            credential_id: Some(U256::from(id)),
        })
    }

    async fn get_credential(
        &self,
        credential_id: U256,
    ) -> Result<Option<CredentialRecord>, LedgerError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.credential_id == credential_id)
            .cloned())
    }

    async fn verify_credential(&self, content_hash: H256) -> Result<Option<U256>, LedgerError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.content_hash == content_hash)
            .map(|r| r.credential_id))
    }

    async fn credentials_of(&self, subject: Address) -> Result<Vec<U256>, LedgerError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject == subject)
            .map(|r| r.credential_id)
            .collect())
    }

    async fn revoke_credential(&self, credential_id: U256) -> Result<TxHash, LedgerError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.credential_id == credential_id)
            .ok_or_else(|| LedgerError::Reverted("unknown credential".to_owned()))?;
        record.revoked = true;
        Ok(H256::from_low_u64_be(1_000 + credential_id.as_u64()))
    }
}
