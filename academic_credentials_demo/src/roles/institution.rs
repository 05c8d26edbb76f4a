use std::{path::Path, sync::Arc, time::Duration};

use academic_credentials::{
    access::{authorize, Access, Role, Session, SessionUser, View},
    contracts::credential_registry::EthersCredentialLedger,
    issuer::{IssuanceProgress, IssuanceWorkflow, Submission},
    storage::PinataStorage,
    types::{
        input::{CredentialCategory, CredentialForm, FileInput, TxOptions},
        output::IssuedCredential,
    },
    utils::hash_to_hex,
    wallet::WalletContext,
};
use anyhow::{anyhow, bail, Context};
use ethers::{signers::Signer, types::U256};
use tokio::sync::watch;

use crate::{config::DemoConfig, ethers_client::EtherSigner};

pub struct Institution {
    name: String,
    session: Session,
    wallet: WalletContext,
    workflow: IssuanceWorkflow,
}

impl Institution {
    pub fn bootstrap(signer: Arc<EtherSigner>, conf: &DemoConfig) -> anyhow::Result<Self> {
        let address = signer.signer().address();

        let mut session = Session::anonymous();
        session.sign_in(SessionUser {
            display_name: conf.institution_name.clone(),
            address,
            role: Role::Institution,
        });

        let ledger = EthersCredentialLedger::new(
            signer,
            &conf.credentials.network,
            conf.credentials.workflow.confirmations,
        )?;
        let storage = PinataStorage::new(conf.credentials.storage.clone())
            .context("set PINATA_JWT to pin credential files")?;

        let workflow = IssuanceWorkflow::new(Arc::new(storage)).with_options(TxOptions {
            gas_limit: conf.credentials.workflow.gas_limit.map(U256::from),
        });

        Ok(Self {
            name: conf.institution_name.clone(),
            session,
            wallet: WalletContext::connected(address, Arc::new(ledger)),
            workflow,
        })
    }

    pub async fn issue(
        &self,
        file_path: &Path,
        subject_name: &str,
        subject_address: &str,
        category: CredentialCategory,
    ) -> anyhow::Result<IssuedCredential> {
        if let Access::Redirect(view) = authorize(&self.session, View::IssueCredential) {
            bail!("not allowed to issue credentials, redirected to {}", view.path());
        }
        debug_assert!(self.session.role().is_some_and(|r| r.can_issue()));

        let mut form = CredentialForm {
            subject_name: subject_name.to_owned(),
            subject_address: subject_address.to_owned(),
            category,
            institution_name: self.name.clone(),
            ..Default::default()
        };

        println!("Institution: uploading {}...", file_path.display());
        let file = FileInput::from_path(file_path)
            .with_context(|| format!("could not read {}", file_path.display()))?;
        self.workflow
            .upload_file(&mut form, file)
            .await
            .map_err(|e| anyhow!(e.notification()))?;

        println!("Institution: issuing {category} to {subject_name}...");
        let reporter = tokio::spawn(report_progress(self.workflow.subscribe()));
        let submission = self
            .workflow
            .submit(&form, &self.wallet)
            .await
            .map_err(|e| anyhow!(e.notification()));
        // the final state is already published, let the reporter print it
        if tokio::time::timeout(Duration::from_secs(1), reporter)
            .await
            .is_err()
        {
            println!("Institution: progress reporter did not finish");
        }

        let issued = match submission? {
            Submission::Completed(issued) => issued,
            Submission::AlreadyInFlight => bail!("an issuance is already running"),
        };

        println!(
            "Institution: issued credential {:?} (metadata hash {}, tx {:?})",
            issued.credential_id,
            hash_to_hex(&issued.content_hash),
            issued.tx_hash
        );
        println!("Institution: file at {}", issued.file.url);
        println!("Institution: metadata at {}", issued.metadata_upload.url);

        Ok(issued)
    }
}

/// Narrate a submission until it settles, returning the state it settled in.
async fn report_progress(mut progress: watch::Receiver<IssuanceProgress>) -> IssuanceProgress {
    while progress.changed().await.is_ok() {
        let state = progress.borrow_and_update().clone();
        match &state {
            IssuanceProgress::Idle => return state,
            IssuanceProgress::AwaitingConfirmation { tx_hash } => {
                println!("Institution: waiting for {tx_hash:?} to confirm...")
            }
            IssuanceProgress::Confirmed { credential_id, .. } => {
                println!("Institution: confirmed, credential id {credential_id:?}");
                return state;
            }
            other => println!("Institution: {other:?}"),
        }
    }
    progress.borrow().clone()
}
