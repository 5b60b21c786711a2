use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::config::ChainConfig;
use crate::errors::ApiError;
use crate::helpers::abi::{encode_call, uint};
use crate::helpers::fees::check_min_price;
use crate::models::{Bundle, Tier, TransactionRequest, Video};

pub const MIN_REFERRAL_CODE_LEN: usize = 3;
pub const MAX_TIP_MESSAGE_LEN: usize = 200;
pub const MAX_COMMENT_LEN: usize = 500;

/// Builds unsigned calls against one contract. Nothing here touches the network;
/// the caller's wallet signs and sends the result.
pub struct CallBuilder {
    chain_id: u64,
    to: Address,
}

impl CallBuilder {
    pub fn new(chain_id: u64, to: Address) -> Self {
        CallBuilder { chain_id, to }
    }

    pub fn paywall(chain: &ChainConfig) -> Result<Self, ApiError> {
        Ok(Self::new(chain.id, chain.paywall()?))
    }

    pub fn social(chain: &ChainConfig) -> Result<Self, ApiError> {
        Ok(Self::new(chain.id, chain.social()?))
    }

    fn build(&self, signature: &str, args: &[Token], value: U256) -> TransactionRequest {
        TransactionRequest {
            chain_id: self.chain_id,
            to: self.to,
            data: encode_call(signature, args),
            value,
        }
    }

    pub fn upload_video(&self, ipfs_hash: &str, price: U256, nft_gate: Option<Address>) -> Result<TransactionRequest, ApiError> {
        let ipfs_hash = ipfs_hash.trim();
        if ipfs_hash.is_empty() {
            return Err(ApiError::Validation("IPFS hash is required".to_string()));
        }
        check_min_price(price)?;

        Ok(self.build(
            "uploadVideo(string,uint256,address)",
            &[
                Token::String(ipfs_hash.to_string()),
                Token::Uint(price),
                Token::Address(nft_gate.unwrap_or_else(Address::zero)),
            ],
            U256::zero(),
        ))
    }

    /// Pays exactly the on-chain price of `video`.
    pub fn unlock_video(&self, video: &Video, referral_code: Option<&str>) -> Result<TransactionRequest, ApiError> {
        if !video.exists() {
            return Err(ApiError::NotFound("Video not found".to_string()));
        }
        if !video.is_active {
            return Err(ApiError::Validation("This video is no longer available".to_string()));
        }

        Ok(self.build(
            "unlockVideo(uint256,string)",
            &[uint(video.id), Token::String(referral(referral_code)?)],
            video.price,
        ))
    }

    pub fn deactivate_video(&self, video_id: u64) -> TransactionRequest {
        self.build("deactivateVideo(uint256)", &[uint(video_id)], U256::zero())
    }

    pub fn create_tier(&self, tier_id: u64, price: U256, name: &str) -> Result<TransactionRequest, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Tier name is required".to_string()));
        }
        check_min_price(price)?;

        Ok(self.build(
            "createTier(uint256,uint256,string)",
            &[uint(tier_id), Token::Uint(price), Token::String(name.to_string())],
            U256::zero(),
        ))
    }

    /// Pays the tier's current price for one period.
    pub fn subscribe(&self, tier: &Tier) -> Result<TransactionRequest, ApiError> {
        if tier.price.is_zero() && tier.name.is_empty() {
            return Err(ApiError::NotFound("Subscription tier not found".to_string()));
        }
        if !tier.is_active {
            return Err(ApiError::Validation("This subscription tier is no longer available".to_string()));
        }

        Ok(self.build(
            "subscribe(address,uint256)",
            &[Token::Address(tier.creator), uint(tier.tier_id)],
            tier.price,
        ))
    }

    /// Stops renewal of the caller's subscription to `creator`.
    pub fn cancel_subscription(&self, creator: Address, tier_id: u64) -> Result<TransactionRequest, ApiError> {
        if creator.is_zero() {
            return Err(ApiError::Validation("Creator address is required".to_string()));
        }

        Ok(self.build(
            "cancelSubscription(address,uint256)",
            &[Token::Address(creator), uint(tier_id)],
            U256::zero(),
        ))
    }

    pub fn send_tip(&self, creator: Address, message: &str, amount: U256) -> Result<TransactionRequest, ApiError> {
        if creator.is_zero() {
            return Err(ApiError::Validation("Creator address is required".to_string()));
        }
        if amount.is_zero() {
            return Err(ApiError::Validation("Please enter a valid amount".to_string()));
        }
        if message.chars().count() > MAX_TIP_MESSAGE_LEN {
            return Err(ApiError::Validation(format!(
                "Tip message must be at most {} characters",
                MAX_TIP_MESSAGE_LEN
            )));
        }

        Ok(self.build(
            "sendTip(address,string)",
            &[Token::Address(creator), Token::String(message.to_string())],
            amount,
        ))
    }

    pub fn create_bundle(&self, video_ids: &[u64], price: U256, name: &str) -> Result<TransactionRequest, ApiError> {
        if video_ids.is_empty() {
            return Err(ApiError::Validation("A bundle needs at least one video".to_string()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Bundle name is required".to_string()));
        }
        check_min_price(price)?;

        Ok(self.build(
            "createBundle(uint256[],uint256,string)",
            &[
                Token::Array(video_ids.iter().copied().map(uint).collect()),
                Token::Uint(price),
                Token::String(name.to_string()),
            ],
            U256::zero(),
        ))
    }

    /// Pays exactly the on-chain price of `bundle`.
    pub fn purchase_bundle(&self, bundle: &Bundle, referral_code: Option<&str>) -> Result<TransactionRequest, ApiError> {
        if bundle.creator.is_zero() {
            return Err(ApiError::NotFound("Bundle not found".to_string()));
        }
        if !bundle.is_active {
            return Err(ApiError::Validation("This bundle is no longer available".to_string()));
        }

        Ok(self.build(
            "purchaseBundle(uint256,string)",
            &[uint(bundle.id), Token::String(referral(referral_code)?)],
            bundle.price,
        ))
    }

    pub fn create_referral_code(&self, code: &str) -> Result<TransactionRequest, ApiError> {
        let code = referral(Some(code))?;
        if code.is_empty() {
            return Err(ApiError::Validation(format!(
                "Referral code must be at least {} characters",
                MIN_REFERRAL_CODE_LEN
            )));
        }

        Ok(self.build("createReferralCode(string)", &[Token::String(code)], U256::zero()))
    }

    pub fn withdraw_earnings(&self) -> TransactionRequest {
        self.build("withdrawEarnings()", &[], U256::zero())
    }

    pub fn withdraw_platform_fees(&self) -> TransactionRequest {
        self.build("withdrawPlatformFees()", &[], U256::zero())
    }

    pub fn post_comment(&self, video_id: u64, content: &str) -> Result<TransactionRequest, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::Validation("Comment cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(ApiError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }

        Ok(self.build(
            "postComment(uint256,string)",
            &[uint(video_id), Token::String(content.to_string())],
            U256::zero(),
        ))
    }

    pub fn like_comment(&self, video_id: u64, comment_index: u64) -> TransactionRequest {
        self.build(
            "likeComment(uint256,uint256)",
            &[uint(video_id), uint(comment_index)],
            U256::zero(),
        )
    }

    pub fn delete_comment(&self, video_id: u64, comment_index: u64) -> TransactionRequest {
        self.build(
            "deleteComment(uint256,uint256)",
            &[uint(video_id), uint(comment_index)],
            U256::zero(),
        )
    }

    pub fn withdraw_tips(&self) -> TransactionRequest {
        self.build("withdrawTips()", &[], U256::zero())
    }
}

/// Blank means "no referral"; anything else must meet the minimum length.
fn referral(code: Option<&str>) -> Result<String, ApiError> {
    let code = code.map(str::trim).unwrap_or_default();

    if !code.is_empty() && code.chars().count() < MIN_REFERRAL_CODE_LEN {
        return Err(ApiError::Validation(format!(
            "Referral code must be at least {} characters",
            MIN_REFERRAL_CODE_LEN
        )));
    }

    Ok(code.to_string())
}
