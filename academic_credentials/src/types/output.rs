use chrono::{DateTime, SubsecRound, Utc};
use ethers::types::{Address, TxHash, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{types::input::CredentialCategory, utils::metadata_hash};

/// What the storage service hands back for any pinned blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// content identifier derived from the uploaded bytes
    pub hash: String,
    /// gateway URL the content can be fetched from
    pub url: String,
}

/// The document pinned next to the credential file and anchored on-chain
/// through its keccak-256 hash.
///
/// Field order is the serialization order, so it is part of the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialMetadata {
    pub subject_name: String,
    pub subject_address: Address,
    pub credential_type: CredentialCategory,
    pub institution_name: String,
    pub issuer_address: Address,
    pub file_hash: String,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl CredentialMetadata {
    /// Build the document for one submission. The timestamp is truncated to
    /// whole seconds so the document survives a JSON round trip unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subject_name: String,
        subject_address: Address,
        credential_type: CredentialCategory,
        institution_name: String,
        issuer_address: Address,
        file: &UploadResult,
        description: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_name,
            subject_address,
            credential_type,
            institution_name,
            issuer_address,
            file_hash: file.hash.clone(),
            file_url: file.url.clone(),
            description,
            issued_at: issued_at.trunc_subsecs(0),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// keccak-256 of the serialized document
    pub fn local_hash(&self) -> Result<H256, serde_json::Error> {
        Ok(metadata_hash(&self.to_bytes()?))
    }

    /// name the document is pinned under
    pub fn pin_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.credential_type,
            self.subject_name.replace(' ', "_"),
            self.issued_at.timestamp()
        )
    }
}

/// Arguments of the contract's issuance entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuanceRequest {
    pub subject: Address,
    /// locally computed hash of the metadata document
    pub content_hash: H256,
    /// storage content hash of the credential file
    pub file_hash: String,
    /// storage content hash of the metadata document
    pub metadata_hash: String,
    pub options: crate::types::input::TxOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuanceReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// read from the `CredentialIssued` event when the receipt carries it
    pub credential_id: Option<U256>,
}

/// Outcome of a confirmed submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCredential {
    pub credential_id: Option<U256>,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub metadata: CredentialMetadata,
    pub content_hash: H256,
    pub file: UploadResult,
    pub metadata_upload: UploadResult,
}

/// A credential as stored by the registry contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    pub credential_id: U256,
    pub subject: Address,
    pub issuer: Address,
    pub content_hash: H256,
    pub file_hash: String,
    pub metadata_hash: String,
    pub issued_at: u64,
    pub revoked: bool,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> CredentialMetadata {
        CredentialMetadata::new(
            "Ada Lovelace".to_owned(),
            Address::from_low_u64_be(0xada),
            CredentialCategory::Degree,
            "University of London".to_owned(),
            Address::from_low_u64_be(0x1),
            &UploadResult {
                hash: "QmFile".to_owned(),
                url: "https://gateway.pinata.cloud/ipfs/QmFile".to_owned(),
            },
            None,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn serializes_in_camel_case_without_empty_description() {
        let json: serde_json::Value = serde_json::from_slice(&sample().to_bytes().unwrap()).unwrap();

        assert_eq!(json["subjectName"], "Ada Lovelace");
        assert_eq!(json["credentialType"], "degree");
        assert_eq!(json["fileHash"], "QmFile");
        assert_eq!(json["issuedAt"], "2023-11-14T22:13:20Z");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn local_hash_is_deterministic() {
        let metadata = sample();
        let first = metadata.local_hash().unwrap();

        for _ in 0..5 {
            assert_eq!(metadata.clone().local_hash().unwrap(), first);
        }
        assert_eq!(sample().local_hash().unwrap(), first);

        let mut other = sample();
        other.subject_name = "Charles Babbage".to_owned();
        assert_ne!(other.local_hash().unwrap(), first);
    }

    #[test]
    fn survives_json_round_trip_with_same_hash() {
        let metadata = CredentialMetadata::new(
            "Grace Hopper".to_owned(),
            Address::from_low_u64_be(0x99),
            CredentialCategory::Certificate,
            "Yale".to_owned(),
            Address::from_low_u64_be(0x2),
            &UploadResult {
                hash: "QmOther".to_owned(),
                url: "https://gateway.pinata.cloud/ipfs/QmOther".to_owned(),
            },
            Some("COBOL".to_owned()),
            Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
        );

        let parsed: CredentialMetadata =
            serde_json::from_slice(&metadata.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed, metadata);
        assert_eq!(parsed.local_hash().unwrap(), metadata.local_hash().unwrap());
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut json: serde_json::Value =
            serde_json::from_slice(&sample().to_bytes().unwrap()).unwrap();
        json["grade"] = serde_json::json!("A+");

        let err = serde_json::from_value::<CredentialMetadata>(json).unwrap_err();
        assert!(err.to_string().contains("unknown field `grade`"));
    }
}
