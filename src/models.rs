use std::fmt::Display;

use ethers::types::{Address, Bytes, U256};
use serde::{Serialize, Serializer};

use crate::helpers::fees::{format_eth, FeeSplit};

/// Serializes integers as JSON strings. Wei amounts overflow a JS number.
pub fn as_string<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: u64,
    pub creator: Address,
    pub ipfs_hash: String,
    #[serde(serialize_with = "as_string")]
    pub price: U256,
    #[serde(serialize_with = "as_string")]
    pub view_count: u64,
    pub is_active: bool,
    pub nft_gate: Address,
    pub has_viewer_access: bool,
}

impl Video {
    /// The contract returns a zeroed record for ids it never issued.
    pub fn exists(&self) -> bool {
        !self.creator.is_zero()
    }

    pub fn has_content(&self) -> bool {
        !self.ipfs_hash.trim().is_empty()
    }

    pub fn is_nft_gated(&self) -> bool {
        !self.nft_gate.is_zero()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<Video>,
    #[serde(serialize_with = "as_string")]
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(flatten)]
    pub video: Video,
    pub gateway_url: String,
    pub nft_gated: bool,
    pub price_eth: String,
    pub fees: FeeSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAccess {
    pub can_watch: bool,
    pub is_creator: bool,
    pub has_unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: u64,
    pub creator: Address,
    pub video_ids: Vec<u64>,
    #[serde(serialize_with = "as_string")]
    pub price: U256,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub creator: Address,
    pub tier_id: u64,
    #[serde(serialize_with = "as_string")]
    pub price: U256,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscriber: Address,
    pub creator: Address,
    pub tier_id: u64,
    pub expires_at: u64,
    pub is_active: bool,
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    pub code: String,
    pub referrer: Address,
    #[serde(serialize_with = "as_string")]
    pub earnings: U256,
    #[serde(serialize_with = "as_string")]
    pub referral_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub owner: Address,
    #[serde(serialize_with = "as_string")]
    pub platform_fee_percent: U256,
    #[serde(serialize_with = "as_string")]
    pub referral_fee_percent: U256,
    #[serde(serialize_with = "as_string")]
    pub video_count: u64,
    #[serde(serialize_with = "as_string")]
    pub bundle_count: u64,
    #[serde(serialize_with = "as_string")]
    pub platform_earnings: U256,
    pub platform_earnings_eth: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorEarnings {
    pub creator: Address,
    #[serde(serialize_with = "as_string")]
    pub earnings: U256,
    pub earnings_eth: String,
}

impl CreatorEarnings {
    pub fn new(creator: Address, earnings: U256) -> Self {
        CreatorEarnings {
            creator,
            earnings,
            earnings_eth: format_eth(earnings, 6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorAnalytics {
    pub total_videos: usize,
    #[serde(serialize_with = "as_string")]
    pub total_views: u64,
    pub avg_views_per_video: f64,
    pub top_videos: Vec<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    pub creator: Address,
    pub videos: Vec<Video>,
    pub analytics: CreatorAnalytics,
    pub earnings: CreatorEarnings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    #[serde(serialize_with = "as_string")]
    pub price: U256,
    pub price_eth: String,
    #[serde(flatten)]
    pub fees: FeeSplit,
    pub platform_fee_eth: String,
    pub creator_earning_eth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTiers {
    pub creator: Address,
    #[serde(serialize_with = "as_string")]
    pub tier_count: u64,
    pub tiers: Vec<Tier>,
}

/// A comment from the social contract. Deleted comments keep their slot so indexes stay stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub index: u64,
    pub author: Address,
    pub content: String,
    pub timestamp: u64,
    #[serde(serialize_with = "as_string")]
    pub likes: u64,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub tipper: Address,
    #[serde(serialize_with = "as_string")]
    pub amount: U256,
    pub amount_eth: String,
    pub message: String,
    pub timestamp: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipBalance {
    pub creator: Address,
    #[serde(serialize_with = "as_string")]
    pub balance: U256,
    pub balance_eth: String,
}

impl TipBalance {
    pub fn new(creator: Address, balance: U256) -> Self {
        TipBalance {
            creator,
            balance,
            balance_eth: format_eth(balance, 6),
        }
    }
}

/// An unsigned call for the viewer's wallet to sign and send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub chain_id: u64,
    pub to: Address,
    pub data: Bytes,
    #[serde(serialize_with = "as_string")]
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub hash: String,
    pub status: TxStatus,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinata_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub allow_token_fallback: bool,
}
