use std::{env, sync::Arc};

use anyhow::Context;
use dotenv::dotenv;
use ethers::{
    core::k256::ecdsa::SigningKey,
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{coins_bip39::English, MnemonicBuilder, Signer, Wallet},
};

use crate::config::DemoConfig;

pub type EtherSigner = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

pub fn get_writer_ethers_client(id: u32, config: &DemoConfig) -> anyhow::Result<Arc<EtherSigner>> {
    dotenv().ok();

    let seed = env::var("MNEMONIC").context("MNEMONIC is not set")?;
    let network = &config.credentials.network;

    let wallet = MnemonicBuilder::<English>::default()
        .phrase(&*seed)
        .index(id)?
        .build()?
        .with_chain_id(network.chain_id);

    let provider = Provider::<Http>::try_from(network.rpc_url.as_str())?;
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}
