use std::path::Path;

use ethers::{
    types::{Address, H256},
    utils::keccak256,
};

use crate::{error::FileRejection, types::input::FileInput};

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const PNG_MEDIA_TYPE: &str = "image/png";
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const BINARY_MEDIA_TYPE: &str = "application/octet-stream";

pub const ACCEPTED_MEDIA_TYPES: &[&str] = &[PNG_MEDIA_TYPE, JPEG_MEDIA_TYPE, PDF_MEDIA_TYPE];

/// Check a file against the accepted types and the size limit. Runs before
/// anything leaves the machine.
pub fn validate_file(file: &FileInput) -> Result<(), FileRejection> {
    if !ACCEPTED_MEDIA_TYPES.contains(&file.media_type.as_str()) {
        return Err(FileRejection::UnsupportedType(file.media_type.clone()));
    }
    if file.content.is_empty() {
        return Err(FileRejection::Empty);
    }
    if file.content.len() > MAX_FILE_SIZE {
        return Err(FileRejection::TooLarge {
            size: file.content.len(),
            max: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

pub fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => PNG_MEDIA_TYPE,
        Some("jpg") | Some("jpeg") => JPEG_MEDIA_TYPE,
        Some("pdf") => PDF_MEDIA_TYPE,
        _ => BINARY_MEDIA_TYPE,
    }
}

pub fn metadata_hash(bytes: &[u8]) -> H256 {
    H256::from(keccak256(bytes))
}

/// '0x' prefixed hex, the form block explorers display
pub fn hash_to_hex(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

pub fn parse_address(address: &str) -> Option<Address> {
    address.trim().parse().ok()
}
