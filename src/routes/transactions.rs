use actix_web::{get, post, web, HttpResponse};
use ethers::types::{Address, TransactionReceipt, TxHash, U64};
use log::info;
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::helpers::fees::{parse_eth, parse_price};
use crate::models::{TransactionStatus, TxStatus};
use crate::AppState;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoInfo {
    #[validate(length(min = 1))]
    ipfs_hash: String,
    price_eth: String,
    nft_gate: Option<Address>,
    chain_id: Option<u64>,
}

#[post("/upload-video")]
pub async fn upload_video(data: web::Json<UploadVideoInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let price = parse_price(&data.price_eth)?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .upload_video(&data.ipfs_hash, price, data.nft_gate)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockVideoInfo {
    video_id: u64,
    referral_code: Option<String>,
    chain_id: Option<u64>,
}

/// Priced from the video as it stands on chain, never from the request.
#[post("/unlock-video")]
pub async fn unlock_video(data: web::Json<UnlockVideoInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let video = state.paywall(data.chain_id)?.get_video(data.video_id, None).await?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .unlock_video(&video, data.referral_code.as_deref())?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateVideoInfo {
    video_id: u64,
    /// The wallet that will sign
    from: Address,
    chain_id: Option<u64>,
}

#[post("/deactivate-video")]
pub async fn deactivate_video(data: web::Json<DeactivateVideoInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let video = state.paywall(data.chain_id)?.get_video(data.video_id, None).await?;

    if !video.exists() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    if video.creator != data.from {
        return Err(ApiError::Forbidden("Only the creator can deactivate this video".to_string()));
    }

    let tx = state.paywall_calls(data.chain_id)?.deactivate_video(data.video_id);

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendTipInfo {
    creator: Address,
    #[validate(length(max = 200))]
    #[serde(default)]
    message: String,
    amount_eth: String,
    chain_id: Option<u64>,
}

#[post("/tip")]
pub async fn send_tip(data: web::Json<SendTipInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let amount = parse_eth(&data.amount_eth)?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .send_tip(data.creator, &data.message, amount)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBundleInfo {
    #[validate(length(min = 1))]
    video_ids: Vec<u64>,
    price_eth: String,
    #[validate(length(min = 1, max = 64))]
    name: String,
    chain_id: Option<u64>,
}

#[post("/create-bundle")]
pub async fn create_bundle(data: web::Json<CreateBundleInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let price = parse_price(&data.price_eth)?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .create_bundle(&data.video_ids, price, &data.name)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBundleInfo {
    bundle_id: u64,
    referral_code: Option<String>,
    chain_id: Option<u64>,
}

#[post("/purchase-bundle")]
pub async fn purchase_bundle(data: web::Json<PurchaseBundleInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bundle = state.paywall(data.chain_id)?.get_bundle(data.bundle_id).await?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .purchase_bundle(&bundle, data.referral_code.as_deref())?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCodeInfo {
    #[validate(length(min = 3, max = 32))]
    code: String,
    chain_id: Option<u64>,
}

#[post("/referral-code")]
pub async fn create_referral_code(data: web::Json<ReferralCodeInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let tx = state
        .paywall_calls(data.chain_id)?
        .create_referral_code(&data.code)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawInfo {
    from: Address,
    chain_id: Option<u64>,
}

#[post("/withdraw-earnings")]
pub async fn withdraw_earnings(data: web::Json<WithdrawInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let earnings = state
        .paywall(data.chain_id)?
        .creator_earnings(data.from)
        .await?;

    if earnings.is_zero() {
        return Err(ApiError::Validation("No earnings to withdraw".to_string()));
    }

    let tx = state.paywall_calls(data.chain_id)?.withdraw_earnings();

    Ok(HttpResponse::Ok().json(tx))
}

#[post("/withdraw-platform-fees")]
pub async fn withdraw_platform_fees(data: web::Json<WithdrawInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(data.chain_id)?;
    let (owner, earnings) = futures::try_join!(contract.platform_owner(), contract.platform_earnings())?;

    if owner != data.from {
        return Err(ApiError::Forbidden("Only the platform owner can withdraw fees".to_string()));
    }
    if earnings.is_zero() {
        return Err(ApiError::Validation("No platform fees to withdraw".to_string()));
    }

    let tx = state.paywall_calls(data.chain_id)?.withdraw_platform_fees();

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
pub struct TransactionPath {
    pub hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    chain_id: Option<u64>,
}

fn is_tx_hash(hash: &str) -> bool {
    hash.strip_prefix("0x")
        .map_or(false, |digits| digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()))
}

fn tx_status(hash: String, receipt: Option<TransactionReceipt>) -> TransactionStatus {
    let receipt = match receipt {
        Some(v) => v,
        None => {
            return TransactionStatus {
                hash,
                status: TxStatus::Pending,
                block_number: None,
            }
        }
    };

    let status = if receipt.status == Some(U64::one()) {
        TxStatus::Confirmed
    } else {
        TxStatus::Failed
    };
    let block_number = receipt.block_number.map(|n| n.as_u64());

    TransactionStatus {
        hash,
        status,
        block_number,
    }
}

#[get("/{hash}")]
pub async fn get_transaction_status(
    path: web::Path<TransactionPath>,
    params: web::Query<TransactionParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let hash = path.into_inner().hash.to_ascii_lowercase();

    let tx_hash = match hash.parse::<TxHash>() {
        Ok(v) if is_tx_hash(&hash) => v,
        _ => return Err(ApiError::Validation(format!("Invalid transaction hash: {}", hash))),
    };

    let chain = state.config.chain(params.chain_id)?;
    let receipt = state.chain.receipt(chain, tx_hash).await?;
    let status = tx_status(hash, receipt);

    info!("Transaction {} is {:?}", status.hash, status.status);

    // a confirmed write may have changed any video record
    if status.status == TxStatus::Confirmed {
        state.cache.clear();
    }

    Ok(HttpResponse::Ok().json(status))
}
