use std::env;
use std::time::Duration;

use ethers::types::Address;

use crate::errors::ApiError;
use crate::helpers::abi::parse_address;

pub const BASE_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

const DEPLOYED_BASE_PAYWALL: &str = "0xc809c90c8b4b0bc8b6ae0ac3679d8b67651dbfac";

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub id: u64,
    pub name: &'static str,
    pub rpc_url: String,
    pub paywall_contract: Address,
    pub social_contract: Address,
}

impl ChainConfig {
    pub fn paywall(&self) -> Result<Address, ApiError> {
        if self.paywall_contract.is_zero() {
            return Err(ApiError::NotDeployed);
        }
        Ok(self.paywall_contract)
    }

    pub fn social(&self) -> Result<Address, ApiError> {
        if self.social_contract.is_zero() {
            return Err(ApiError::NotDeployed);
        }
        Ok(self.social_contract)
    }
}

pub struct Config {
    pub bind_address: String,
    /// Server-held pinning token. Never serialized or logged.
    pub pinata_jwt: Option<String>,
    pub pinata_api_url: String,
    pub default_chain_id: u64,
    pub video_cache_ttl: Duration,
    pub video_cache_capacity: usize,
    pub chains: Vec<ChainConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ApiError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let address = |key: &str, default: &str| {
            parse_address(&var_or(key, default))
                .map_err(|_| ApiError::Config(format!("{} is not a valid address", key)))
        };

        let number = |key: &str, default: u64| match lookup(key).filter(|v| !v.trim().is_empty()) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ApiError::Config(format!("{} must be a whole number", key))),
            None => Ok(default),
        };

        let zero = format!("{:?}", Address::zero());

        let chains = vec![
            ChainConfig {
                id: BASE_CHAIN_ID,
                name: "Base",
                rpc_url: var_or("BASE_RPC_URL", "https://mainnet.base.org"),
                paywall_contract: address("PAYWALL_CONTRACT_BASE", DEPLOYED_BASE_PAYWALL)?,
                social_contract: address("SOCIAL_CONTRACT_BASE", &zero)?,
            },
            ChainConfig {
                id: BASE_SEPOLIA_CHAIN_ID,
                name: "Base Sepolia",
                rpc_url: var_or("BASE_SEPOLIA_RPC_URL", "https://sepolia.base.org"),
                paywall_contract: address("PAYWALL_CONTRACT_BASE_SEPOLIA", &zero)?,
                social_contract: address("SOCIAL_CONTRACT_BASE_SEPOLIA", &zero)?,
            },
        ];

        let default_chain_id = number("DEFAULT_CHAIN_ID", BASE_CHAIN_ID)?;
        if !chains.iter().any(|c| c.id == default_chain_id) {
            return Err(ApiError::Config(format!(
                "DEFAULT_CHAIN_ID {} is not a supported chain",
                default_chain_id
            )));
        }

        Ok(Config {
            bind_address: var_or("BIND_ADDRESS", "127.0.0.1:5000"),
            pinata_jwt: lookup("PINATA_JWT").filter(|v| !v.trim().is_empty()),
            pinata_api_url: var_or("PINATA_API_URL", "https://api.pinata.cloud")
                .trim_end_matches('/')
                .to_string(),
            default_chain_id,
            video_cache_ttl: Duration::from_secs(number("VIDEO_CACHE_TTL_SECS", 300)?),
            video_cache_capacity: number("VIDEO_CACHE_CAPACITY", 1024)? as usize,
            chains,
        })
    }

    /// Resolves a requested chain id, falling back to the default chain.
    pub fn chain(&self, chain_id: Option<u64>) -> Result<&ChainConfig, ApiError> {
        let id = chain_id.unwrap_or(self.default_chain_id);
        self.chains
            .iter()
            .find(|c| c.id == id)
            .ok_or(ApiError::UnsupportedChain(id))
    }
}
