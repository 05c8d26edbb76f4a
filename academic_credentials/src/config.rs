use std::error::Error;

const RPC_URL_ENV_VAR: &str = "RPC_URL";
const CHAIN_ID_ENV_VAR: &str = "CHAIN_ID";
const CREDENTIAL_REGISTRY_ADDRESS_ENV_VAR: &str = "CREDENTIAL_REGISTRY_ADDRESS";
const PINATA_API_URL_ENV_VAR: &str = "PINATA_API_URL";
const PINATA_JWT_ENV_VAR: &str = "PINATA_JWT";
const IPFS_GATEWAY_URL_ENV_VAR: &str = "IPFS_GATEWAY_URL";
const CONFIRMATIONS_ENV_VAR: &str = "CONFIRMATIONS";
const GAS_LIMIT_ENV_VAR: &str = "GAS_LIMIT";

const DEFAULT_RPC_URL: &str = "http://localhost:8545";
const DEFAULT_CHAIN_ID: u64 = 31337;
const DEFAULT_CREDENTIAL_REGISTRY_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud/";
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://gateway.pinata.cloud/";
const DEFAULT_CONFIRMATIONS: usize = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct ContractNetworkConfig {
    pub contract_address: String,
    pub rpc_url: String,
    pub chain_id: u64,
}

/// Pinning service endpoints. `jwt` is the bearer token of the pinning API,
/// reads through the gateway need no credentials.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub jwt: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowConfig {
    /// blocks to wait on top of the inclusion block before a transaction counts as confirmed
    pub confirmations: usize,
    pub gas_limit: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confirmations: DEFAULT_CONFIRMATIONS,
            gas_limit: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CredentialsConfig {
    pub network: ContractNetworkConfig,
    pub storage: StorageConfig,
    pub workflow: WorkflowConfig,
}

impl CredentialsConfig {
    /// load from env, else local
    pub fn load() -> Self {
        match Self::try_from_env() {
            Ok(c) => {
                log::info!("Loaded config from env");
                c
            }
            Err(e) => {
                log::warn!("Failed to load config from env: {}", e);
                log::info!("Loading local config");
                Self::local()
            }
        }
    }

    pub fn local() -> Self {
        Self {
            network: ContractNetworkConfig {
                rpc_url: DEFAULT_RPC_URL.to_string(),
                chain_id: DEFAULT_CHAIN_ID,
                contract_address: DEFAULT_CREDENTIAL_REGISTRY_ADDRESS.to_string(),
            },
            storage: StorageConfig {
                api_url: DEFAULT_PINATA_API_URL.to_string(),
                gateway_url: DEFAULT_IPFS_GATEWAY_URL.to_string(),
                jwt: None,
            },
            workflow: WorkflowConfig::default(),
        }
    }

    pub fn try_from_env() -> Result<Self, Box<dyn Error>> {
        dotenv::dotenv().ok();

        let rpc_url = std::env::var(RPC_URL_ENV_VAR)?;
        let chain_id = std::env::var(CHAIN_ID_ENV_VAR)?.parse()?;
        let contract_address = std::env::var(CREDENTIAL_REGISTRY_ADDRESS_ENV_VAR)?;

        // the pinning service is optional config, reads still work against the public gateway
        let api_url =
            std::env::var(PINATA_API_URL_ENV_VAR).unwrap_or(DEFAULT_PINATA_API_URL.to_owned());
        let gateway_url =
            std::env::var(IPFS_GATEWAY_URL_ENV_VAR).unwrap_or(DEFAULT_IPFS_GATEWAY_URL.to_owned());
        let jwt = std::env::var(PINATA_JWT_ENV_VAR).ok();

        let confirmations = match std::env::var(CONFIRMATIONS_ENV_VAR) {
            Ok(c) => c.parse()?,
            Err(_) => DEFAULT_CONFIRMATIONS,
        };
        let gas_limit = match std::env::var(GAS_LIMIT_ENV_VAR) {
            Ok(g) => Some(g.parse()?),
            Err(_) => None,
        };

        Ok(Self {
            network: ContractNetworkConfig {
                contract_address,
                rpc_url,
                chain_id,
            },
            storage: StorageConfig {
                api_url,
                gateway_url,
                jwt,
            },
            workflow: WorkflowConfig {
                confirmations,
                gas_limit,
            },
        })
    }
}
