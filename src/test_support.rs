use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, TransactionReceipt, TxHash, U256, U64};
use ethers::utils::id;

use crate::config::{ChainConfig, Config};
use crate::errors::ApiError;
use crate::helpers::cache::VideoCache;
use crate::helpers::chain::ChainReader;
use crate::helpers::pinata::{PinResult, PinUpload, Pinner, ProgressCallback, UploadProgress};
use crate::AppState;

type Handler = Box<dyn Fn(&[u8]) -> Result<Vec<u8>, ApiError> + Send + Sync>;

/// Answers `eth_call`s by selector and counts them.
#[derive(Default)]
pub struct MockChain {
    handlers: HashMap<[u8; 4], (String, Handler)>,
    calls: Mutex<HashMap<String, usize>>,
    senders: Mutex<Vec<Option<Address>>>,
    receipts: HashMap<TxHash, TransactionReceipt>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// `handler` receives the arguments with the selector stripped.
    pub fn on<F>(mut self, signature: &str, handler: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>, ApiError> + Send + Sync + 'static,
    {
        self.handlers
            .insert(id(signature), (signature.to_string(), Box::new(handler)));
        self
    }

    pub fn with_receipt(mut self, hash: &str, status: u64, block_number: u64) -> Self {
        self.receipts.insert(
            hash.parse().unwrap(),
            TransactionReceipt {
                status: Some(U64::from(status)),
                block_number: Some(U64::from(block_number)),
                ..Default::default()
            },
        );
        self
    }

    pub fn calls(&self, signature: &str) -> usize {
        self.calls.lock().unwrap().get(signature).copied().unwrap_or(0)
    }

    pub fn senders(&self) -> Vec<Option<Address>> {
        self.senders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(
        &self,
        _chain: &ChainConfig,
        _to: Address,
        data: Bytes,
        from: Option<Address>,
    ) -> Result<Bytes, ApiError> {
        let (head, args) = data.split_at(data.len().min(4));
        let (signature, handler) = self
            .handlers
            .get(head)
            .ok_or_else(|| ApiError::Contract("Transaction reverted: unknown function".to_string()))?;

        *self.calls.lock().unwrap().entry(signature.clone()).or_insert(0) += 1;
        self.senders.lock().unwrap().push(from);

        handler(args).map(Bytes::from)
    }

    async fn receipt(&self, _chain: &ChainConfig, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, ApiError> {
        Ok(self.receipts.get(&tx_hash).cloned())
    }
}

pub struct PinnedFile {
    pub file_name: String,
    pub mime: String,
    pub size: u64,
    pub path: PathBuf,
    /// Whether the temp file was still on disk while pinning.
    pub existed: bool,
}

/// Records what it was asked to pin and answers with a canned result.
pub struct MockPinner {
    result: Result<String, String>,
    pub tokens: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<PinnedFile>>,
}

impl MockPinner {
    pub fn pinning_as(ipfs_hash: &str) -> Self {
        MockPinner {
            result: Ok(ipfs_hash.to_string()),
            tokens: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_with(message: &str) -> Self {
        MockPinner {
            result: Err(message.to_string()),
            tokens: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Pinner for MockPinner {
    async fn pin_file(
        &self,
        upload: PinUpload,
        token: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<PinResult, ApiError> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.uploads.lock().unwrap().push(PinnedFile {
            file_name: upload.file_name.clone(),
            mime: upload.mime.clone(),
            size: upload.size,
            existed: upload.path.exists(),
            path: upload.path.clone(),
        });

        if let Some(progress) = progress {
            progress(UploadProgress::new(upload.size, upload.size));
        }

        match &self.result {
            Ok(hash) => Ok(PinResult::new(hash.clone())),
            Err(message) => Err(ApiError::Upload(message.clone())),
        }
    }
}

pub fn addr(last: u8) -> Address {
    Address::from_low_u64_be(last as u64)
}

/// Full lowercase hex, the way addresses go over the wire.
pub fn hex_addr(last: u8) -> String {
    format!("{:?}", addr(last))
}

pub const SOCIAL: &str = "0x00000000000000000000000000000000000000ee";

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "PINATA_JWT" => Some("server-jwt".to_string()),
        "SOCIAL_CONTRACT_BASE" => Some(SOCIAL.to_string()),
        _ => None,
    })
    .unwrap()
}

/// Return data of `getVideo(uint256)`.
pub fn video_return(creator: Address, ipfs_hash: &str, price: u64, view_count: u64, is_active: bool) -> Vec<u8> {
    video_return_for(creator, ipfs_hash, U256::from(price), view_count, is_active, false)
}

/// Return data of `getVideo(uint256)` with an explicit wei price and viewer access flag.
pub fn video_return_for(
    creator: Address,
    ipfs_hash: &str,
    price: U256,
    view_count: u64,
    is_active: bool,
    has_viewer_access: bool,
) -> Vec<u8> {
    abi::encode(&[
        Token::Address(creator),
        Token::String(ipfs_hash.to_string()),
        Token::Uint(price),
        Token::Uint(U256::from(view_count)),
        Token::Bool(is_active),
        Token::Address(Address::zero()),
        Token::Bool(has_viewer_access),
    ])
}

pub fn uint_return(value: impl Into<U256>) -> Vec<u8> {
    abi::encode(&[Token::Uint(value.into())])
}

pub fn bool_return(value: bool) -> Vec<u8> {
    abi::encode(&[Token::Bool(value)])
}

pub fn address_return(address: Address) -> Vec<u8> {
    abi::encode(&[Token::Address(address)])
}

/// The `index`th static argument as a number.
pub fn arg(args: &[u8], index: usize) -> u64 {
    U256::from_big_endian(&args[index * 32..(index + 1) * 32]).low_u64()
}

pub fn first_arg(args: &[u8]) -> u64 {
    arg(args, 0)
}

pub fn app_state(chain: Arc<MockChain>, pinner: Arc<MockPinner>) -> web::Data<AppState> {
    app_state_with(test_config(), chain, pinner)
}

pub fn app_state_with(config: Config, chain: Arc<MockChain>, pinner: Arc<MockPinner>) -> web::Data<AppState> {
    web::Data::new(AppState {
        cache: VideoCache::new(Duration::from_secs(60), 64),
        config,
        chain,
        pinner,
    })
}
