use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::ParamType;
use ethers::providers::{Http, JsonRpcError, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash};
use ethers::utils::id;
use log::{debug, error};
use serde_json::Value;

use crate::config::ChainConfig;
use crate::errors::{friendly_message, ApiError};
use crate::helpers::abi::decode_output;

/// Read access to a chain. Writes never go through here: the viewer's wallet signs them.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block. `from` makes viewer-specific views answer for that viewer.
    async fn call(
        &self,
        chain: &ChainConfig,
        to: Address,
        data: Bytes,
        from: Option<Address>,
    ) -> Result<Bytes, ApiError>;

    /// `None` while the transaction is still pending.
    async fn receipt(&self, chain: &ChainConfig, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, ApiError>;
}

fn decode_revert_reason(data: &str) -> Option<String> {
    let bytes = hex::decode(data.trim_start_matches("0x")).ok()?;
    let (head, rest) = (bytes.get(..4)?, bytes.get(4..)?);

    if head != &id("Error(string)")[..] {
        return None;
    }

    decode_output::<String>(&[ParamType::String], rest).ok()
}

/// Node message plus the decoded `Error(string)` reason when the node attaches revert data.
fn describe(response: &JsonRpcError) -> String {
    let reason = response
        .data
        .as_ref()
        .and_then(Value::as_str)
        .and_then(decode_revert_reason);

    match reason {
        Some(reason) if !response.message.contains(&reason) => format!("{}: {}", response.message, reason),
        _ => response.message.clone(),
    }
}

/// One HTTP provider per configured chain.
pub struct RpcClient {
    providers: HashMap<u64, Provider<Http>>,
}

impl RpcClient {
    pub fn new(chains: &[ChainConfig]) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Config(format!("Couldn't build RPC client: {}", e)))?;

        let mut providers = HashMap::new();
        for chain in chains {
            let url = chain
                .rpc_url
                .parse::<reqwest::Url>()
                .map_err(|e| ApiError::Config(format!("Invalid RPC URL for {}: {}", chain.name, e)))?;

            providers.insert(chain.id, Provider::new(Http::new_with_client(url, client.clone())));
        }

        Ok(RpcClient { providers })
    }

    fn provider(&self, chain: &ChainConfig) -> Result<&Provider<Http>, ApiError> {
        self.providers
            .get(&chain.id)
            .ok_or(ApiError::UnsupportedChain(chain.id))
    }
}

fn rpc_failure(chain: &ChainConfig, err: ProviderError) -> ApiError {
    match err.as_error_response() {
        Some(response) => ApiError::Contract(friendly_message(&describe(response))),
        None => {
            error!("RPC request to {} failed: {}", chain.name, err);
            ApiError::Contract(format!("Couldn't reach the {} RPC endpoint", chain.name))
        }
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn call(
        &self,
        chain: &ChainConfig,
        to: Address,
        data: Bytes,
        from: Option<Address>,
    ) -> Result<Bytes, ApiError> {
        debug!("eth_call to {:?} on {}", to, chain.name);

        let mut request = TransactionRequest::new().to(to).data(data);
        if let Some(from) = from {
            request = request.from(from);
        }
        let tx: TypedTransaction = request.into();

        self.provider(chain)?
            .call(&tx, None)
            .await
            .map_err(|e| rpc_failure(chain, e))
    }

    async fn receipt(&self, chain: &ChainConfig, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, ApiError> {
        self.provider(chain)?
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| rpc_failure(chain, e))
    }
}
