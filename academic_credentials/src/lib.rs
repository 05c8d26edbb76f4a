pub mod access;
pub mod config;
pub mod contracts;
pub mod error;
pub mod issuer;
pub mod storage;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod wallet;

#[cfg(test)]
mod testing;
