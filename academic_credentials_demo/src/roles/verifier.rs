use std::sync::Arc;

use academic_credentials::{
    access::{authorize, Access, Role, Session, SessionUser, View},
    contracts::credential_registry::EthersCredentialLedger,
    storage::PinataStorage,
    verifier::{CredentialVerifier, VerificationOutcome},
};
use anyhow::bail;
use ethers::{signers::Signer, types::H256};

use crate::{config::DemoConfig, ethers_client::EtherSigner};

pub struct Verifier {
    session: Session,
    verifier: CredentialVerifier,
}

impl Verifier {
    pub fn bootstrap(signer: Arc<EtherSigner>, conf: &DemoConfig) -> anyhow::Result<Self> {
        let mut session = Session::anonymous();
        session.sign_in(SessionUser {
            display_name: String::from("Verifier"),
            address: signer.signer().address(),
            role: Role::Verifier,
        });

        let ledger = EthersCredentialLedger::new(
            signer,
            &conf.credentials.network,
            conf.credentials.workflow.confirmations,
        )?;
        let storage = PinataStorage::new(conf.credentials.storage.clone())?;

        Ok(Self {
            session,
            verifier: CredentialVerifier::new(Arc::new(storage), Arc::new(ledger)),
        })
    }

    /// Look the credential up by its metadata hash and check it end to end.
    pub async fn check(&self, content_hash: H256) -> anyhow::Result<bool> {
        if let Access::Redirect(view) = authorize(&self.session, View::VerifyCredential) {
            bail!("verification unavailable, redirected to {}", view.path());
        }

        let outcome = self.verifier.verify_by_hash(content_hash).await?;
        match &outcome {
            VerificationOutcome::Valid { record, metadata } => println!(
                "Verifier: credential {} is valid: {} holds a {} from {}",
                record.credential_id,
                metadata.subject_name,
                metadata.credential_type,
                metadata.institution_name
            ),
            VerificationOutcome::Revoked { record, .. } => {
                println!("Verifier: credential {} was revoked", record.credential_id)
            }
            VerificationOutcome::HashMismatch { expected, actual } => println!(
                "Verifier: metadata was altered (anchored {expected:?}, found {actual:?})"
            ),
            VerificationOutcome::FileMismatch { expected, actual } => println!(
                "Verifier: metadata references {actual}, the record anchors {expected}"
            ),
            VerificationOutcome::NotFound => println!("Verifier: no such credential"),
        }

        Ok(outcome.is_valid())
    }
}
