use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use ethers::types::{Address, TxHash, U256};
use tokio::sync::watch;

use crate::{
    error::{IssuanceError, IssuanceStep, Precondition},
    storage::CredentialStorage,
    types::{
        input::{CredentialForm, FileInput, TxOptions},
        output::{CredentialMetadata, IssuanceRequest, IssuedCredential, UploadResult},
    },
    utils::{hash_to_hex, metadata_hash, parse_address, validate_file},
    wallet::WalletContext,
};

/// What the wizard is currently doing, for a front-end to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuanceProgress {
    /// editable form
    Idle,
    UploadingFile,
    UploadingMetadata,
    Hashing,
    Submitting,
    AwaitingConfirmation { tx_hash: TxHash },
    Confirmed {
        tx_hash: TxHash,
        credential_id: Option<U256>,
    },
}

/// Result of a user gesture. A gesture made while another one is still
/// running does nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission<T> {
    Completed(T),
    AlreadyInFlight,
}

impl<T> Submission<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Submission::Completed(t) => Some(t),
            Submission::AlreadyInFlight => None,
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Checked form fields, ready to go into a metadata document.
struct ValidatedSubmission<'a> {
    file: &'a UploadResult,
    subject: Address,
    issuer: Address,
}

/// The two-step issuance wizard: upload the credential file, then submit
/// the form to pin the metadata and anchor it on-chain.
pub struct IssuanceWorkflow {
    storage: Arc<dyn CredentialStorage>,
    options: TxOptions,
    in_flight: AtomicBool,
    progress: watch::Sender<IssuanceProgress>,
}

impl IssuanceWorkflow {
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        let (progress, _) = watch::channel(IssuanceProgress::Idle);
        Self {
            storage,
            options: TxOptions::default(),
            in_flight: AtomicBool::new(false),
            progress,
        }
    }

    pub fn with_options(mut self, options: TxOptions) -> Self {
        self.options = options;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<IssuanceProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> IssuanceProgress {
        self.progress.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_progress(&self, progress: IssuanceProgress) {
        self.progress.send_replace(progress);
    }

    /// Step one: validate the picked file and pin it. On success the upload
    /// is recorded on the form.
    pub async fn upload_file(
        &self,
        form: &mut CredentialForm,
        file: FileInput,
    ) -> Result<Submission<UploadResult>, IssuanceError> {
        let Some(_guard) = InFlightGuard::claim(&self.in_flight) else {
            log::debug!("upload ignored, another request is in flight");
            return Ok(Submission::AlreadyInFlight);
        };

        validate_file(&file)?;

        self.set_progress(IssuanceProgress::UploadingFile);
        let res = self.storage.upload_file(&file).await;
        self.set_progress(IssuanceProgress::Idle);

        let upload = res.map_err(|source| {
            log::warn!("upload of '{}' failed: {source}", file.file_name);
            IssuanceError::Storage {
                step: IssuanceStep::UploadFile,
                source,
            }
        })?;

        log::info!("uploaded '{}' as {}", file.file_name, upload.hash);
        form.file = Some(upload.clone());
        Ok(Submission::Completed(upload))
    }

    /// Step two: pin the metadata document, anchor it on-chain and wait for
    /// confirmation. The form is left untouched so a failed attempt can be
    /// resubmitted as is.
    pub async fn submit(
        &self,
        form: &CredentialForm,
        wallet: &WalletContext,
    ) -> Result<Submission<IssuedCredential>, IssuanceError> {
        let Some(_guard) = InFlightGuard::claim(&self.in_flight) else {
            log::debug!("submission ignored, another one is in flight");
            return Ok(Submission::AlreadyInFlight);
        };

        match self.run_submission(form, wallet).await {
            Ok(issued) => Ok(Submission::Completed(issued)),
            Err(e) => {
                log::warn!("{}", e.notification());
                self.set_progress(IssuanceProgress::Idle);
                Err(e)
            }
        }
    }

    fn check_preconditions<'a>(
        form: &'a CredentialForm,
        wallet: &WalletContext,
    ) -> Result<ValidatedSubmission<'a>, Precondition> {
        let file = match (&form.file, form.file_hash()) {
            (Some(file), Some(_)) => file,
            _ => return Err(Precondition::NoUploadedFile),
        };
        if form.subject_name.trim().is_empty() {
            return Err(Precondition::MissingField("subject name"));
        }
        if form.subject_address.trim().is_empty() {
            return Err(Precondition::MissingField("subject address"));
        }
        let subject = parse_address(&form.subject_address)
            .ok_or_else(|| Precondition::InvalidSubjectAddress(form.subject_address.clone()))?;
        if form.institution_name.trim().is_empty() {
            return Err(Precondition::MissingField("institution name"));
        }
        let issuer = wallet.account().ok_or(Precondition::NoWalletAccount)?;
        if wallet.ledger().is_none() {
            return Err(Precondition::NoContractClient);
        }

        Ok(ValidatedSubmission {
            file,
            subject,
            issuer,
        })
    }

    async fn run_submission(
        &self,
        form: &CredentialForm,
        wallet: &WalletContext,
    ) -> Result<IssuedCredential, IssuanceError> {
        let checked =
            Self::check_preconditions(form, wallet).map_err(IssuanceError::MissingPrecondition)?;
        let ledger = wallet
            .ledger()
            .ok_or(IssuanceError::MissingPrecondition(Precondition::NoContractClient))?;

        // (a) pin the metadata document
        self.set_progress(IssuanceProgress::UploadingMetadata);
        let metadata = CredentialMetadata::new(
            form.subject_name.trim().to_owned(),
            checked.subject,
            form.category,
            form.institution_name.trim().to_owned(),
            checked.issuer,
            checked.file,
            form.description.clone().filter(|d| !d.trim().is_empty()),
            Utc::now(),
        );
        // serialized once: these bytes are both pinned and hashed
        let bytes = metadata.to_bytes()?;
        let metadata_cid = self
            .storage
            .upload_json(&bytes, &metadata.pin_name())
            .await
            .map_err(|source| IssuanceError::Storage {
                step: IssuanceStep::UploadMetadata,
                source,
            })?;
        log::info!("metadata pinned as {metadata_cid}");

        // (b) bind the exact bytes locally
        self.set_progress(IssuanceProgress::Hashing);
        let content_hash = metadata_hash(&bytes);
        log::debug!("metadata hash {}", hash_to_hex(&content_hash));

        // (c) anchor on-chain
        self.set_progress(IssuanceProgress::Submitting);
        let tx_hash = ledger
            .submit_issuance(IssuanceRequest {
                subject: checked.subject,
                content_hash,
                file_hash: checked.file.hash.clone(),
                metadata_hash: metadata_cid.clone(),
                options: self.options,
            })
            .await
            .map_err(|e| IssuanceError::from_ledger(IssuanceStep::SubmitTransaction, e))?;

        // (d) wait for it
        self.set_progress(IssuanceProgress::AwaitingConfirmation { tx_hash });
        let receipt = ledger
            .wait_for_confirmation(tx_hash)
            .await
            .map_err(|e| IssuanceError::from_ledger(IssuanceStep::AwaitConfirmation, e))?;

        self.set_progress(IssuanceProgress::Confirmed {
            tx_hash,
            credential_id: receipt.credential_id,
        });
        log::info!(
            "credential for {:?} confirmed in block {:?}",
            checked.subject,
            receipt.block_number
        );

        Ok(IssuedCredential {
            credential_id: receipt.credential_id,
            tx_hash,
            block_number: receipt.block_number,
            content_hash,
            file: checked.file.clone(),
            metadata_upload: UploadResult {
                url: self.storage.url_for(&metadata_cid),
                hash: metadata_cid,
            },
            metadata,
        })
    }
}
