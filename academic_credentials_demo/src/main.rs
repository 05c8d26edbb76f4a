pub mod config;
pub mod ethers_client;
pub mod roles;

use std::path::Path;

use academic_credentials::types::input::CredentialCategory;
use anyhow::{anyhow, bail};

use crate::{
    config::DemoConfig,
    ethers_client::get_writer_ethers_client,
    roles::{Institution, Verifier},
};

const USAGE: &str =
    "usage: academic_credentials_demo <file> <subject name> <subject address> [degree|certificate|diploma]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [file_path, subject_name, subject_address, rest @ ..] = args.as_slice() else {
        bail!(USAGE);
    };
    let category = match rest.first() {
        Some(c) => c.parse::<CredentialCategory>().map_err(|e| anyhow!(e))?,
        None => CredentialCategory::default(),
    };

    let conf = DemoConfig::load();
    let signer = get_writer_ethers_client(0, &conf)?;

    println!("Institution: setting up...");
    let institution = Institution::bootstrap(signer.clone(), &conf)?;
    println!("Verifier: setting up...");
    let verifier = Verifier::bootstrap(signer, &conf)?;

    println!("\n########## ISSUANCE ###########\n");
    let issued = institution
        .issue(Path::new(file_path), subject_name, subject_address, category)
        .await?;
    println!("\n########## END OF ISSUANCE ###########\n");

    println!("\n########## VERIFICATION ###########\n");
    let valid = verifier.check(issued.content_hash).await?;
    println!("\n########## END OF VERIFICATION ###########\n");

    if !valid {
        bail!("freshly issued credential did not verify");
    }
    Ok(())
}
