//! Content-addressed file storage. The production client talks to a
//! Pinata-style IPFS pinning API and reads back through an HTTP gateway.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{
    config::StorageConfig,
    error::StorageError,
    types::{input::FileInput, output::UploadResult},
};

const PIN_FILE_PATH: &str = "pinning/pinFileToIPFS";
const JSON_MEDIA_TYPE: &str = "application/json";

#[async_trait]
pub trait CredentialStorage: Send + Sync {
    /// Pin a binary file, returning its content hash and retrieval URL.
    async fn upload_file(&self, file: &FileInput) -> Result<UploadResult, StorageError>;

    /// Pin a serialized JSON document under `name`, byte for byte, returning
    /// its content hash. Fetching the hash must give back exactly `document`.
    async fn upload_json(&self, document: &[u8], name: &str) -> Result<String, StorageError>;

    /// Fetch previously pinned content by hash.
    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, StorageError>;

    fn url_for(&self, hash: &str) -> String;
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pin_size: u64,
}

pub struct PinataStorage {
    client: reqwest::Client,
    api_url: Url,
    gateway_url: Url,
    jwt: String,
}

impl PinataStorage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let jwt = config.jwt.ok_or(StorageError::MissingCredentials)?;

        Ok(Self {
            client: reqwest::Client::default(),
            api_url: base_url(&config.api_url)?,
            gateway_url: base_url(&config.gateway_url)?,
            jwt,
        })
    }

    async fn pin_bytes(
        &self,
        content: Vec<u8>,
        file_name: &str,
        media_type: &str,
    ) -> Result<String, StorageError> {
        let part = Part::bytes(content)
            .file_name(file_name.to_owned())
            .mime_str(media_type)?;
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": file_name }).to_string());

        let res = self
            .client
            .post(self.api_url.join(PIN_FILE_PATH)?)
            .multipart(form)
            .bearer_auth(&self.jwt)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let pinned = res.json::<PinResponse>().await?;
        log::debug!(
            "pinned '{file_name}' ({} bytes) as {}",
            pinned.pin_size,
            pinned.ipfs_hash
        );
        Ok(pinned.ipfs_hash)
    }
}

#[async_trait]
impl CredentialStorage for PinataStorage {
    async fn upload_file(&self, file: &FileInput) -> Result<UploadResult, StorageError> {
        let hash = self
            .pin_bytes(file.content.clone(), &file.file_name, &file.media_type)
            .await?;

        Ok(UploadResult {
            url: self.url_for(&hash),
            hash,
        })
    }

    // pinned as a file rather than through pinJSONToIPFS, which re-encodes
    // the document and would break the anchored hash
    async fn upload_json(&self, document: &[u8], name: &str) -> Result<String, StorageError> {
        self.pin_bytes(document.to_vec(), &format!("{name}.json"), JSON_MEDIA_TYPE)
            .await
    }

    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.gateway_url.join(&format!("ipfs/{hash}"))?;
        let res = self.client.get(url).send().await?;

        match res.status() {
            reqwest::StatusCode::NOT_FOUND => Err(StorageError::NotFound(hash.to_owned())),
            status if !status.is_success() => Err(StorageError::Status {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            }),
            _ => Ok(res.bytes().await?.to_vec()),
        }
    }

    fn url_for(&self, hash: &str) -> String {
        format!("{}ipfs/{hash}", self.gateway_url)
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'
fn base_url(raw: &str) -> Result<Url, StorageError> {
    let mut raw = raw.trim().to_owned();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Ok(Url::parse(&raw)?)
}
