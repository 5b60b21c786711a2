use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use ethers::types::Address;
use log::info;
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::helpers::fees::parse_price;
use crate::AppState;

#[derive(Deserialize)]
pub struct TierPath {
    pub creator: Address,
    pub tier_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierParams {
    chain_id: Option<u64>,
}

#[get("/{creator}/tiers/{tier_id}")]
pub async fn get_tier(
    path: web::Path<TierPath>,
    params: web::Query<TierParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let tier = contract.creator_tier(path.creator, path.tier_id).await?;

    if tier.price.is_zero() && tier.name.is_empty() {
        return Err(ApiError::NotFound("Subscription tier not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(tier))
}

#[derive(Deserialize)]
pub struct CreatorPath {
    pub creator: Address,
}

/// Every tier the creator has set up, active or not.
#[get("/{creator}/tiers")]
pub async fn get_tiers(
    path: web::Path<CreatorPath>,
    params: web::Query<TierParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let tiers = contract.creator_tiers(path.creator).await?;

    Ok(HttpResponse::Ok().json(tiers))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusParams {
    subscriber: Option<Address>,
    chain_id: Option<u64>,
}

#[get("/{creator}/status")]
pub async fn get_subscription_status(
    path: web::Path<CreatorPath>,
    params: web::Query<SubscriptionStatusParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = match params.subscriber {
        Some(v) => v,
        None => return Err(ApiError::MissingParameters),
    };

    let contract = state.paywall(params.chain_id)?;
    let now = Utc::now().timestamp().max(0) as u64;
    let subscription = contract.subscription(subscriber, path.creator, now).await?;

    Ok(HttpResponse::Ok().json(subscription))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTierInfo {
    tier_id: u64,
    /// Monthly price in ETH
    price_eth: String,
    #[validate(length(min = 1, max = 64))]
    name: String,
    chain_id: Option<u64>,
}

#[post("/create-tier")]
pub async fn create_tier(data: web::Json<CreateTierInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let price = parse_price(&data.price_eth)?;
    let tx = state
        .paywall_calls(data.chain_id)?
        .create_tier(data.tier_id, price, &data.name)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInfo {
    creator: Address,
    tier_id: u64,
    chain_id: Option<u64>,
}

/// Priced from the tier as it stands on chain, never from the request.
#[post("/subscribe")]
pub async fn subscribe(data: web::Json<SubscribeInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tier = state
        .paywall(data.chain_id)?
        .creator_tier(data.creator, data.tier_id)
        .await?;

    let tx = state.paywall_calls(data.chain_id)?.subscribe(&tier)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionInfo {
    from: Address,
    creator: Address,
    chain_id: Option<u64>,
}

/// Cancels the caller's current subscription to `creator`. The tier comes from chain.
#[post("/cancel-subscription")]
pub async fn cancel_subscription(
    data: web::Json<CancelSubscriptionInfo>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now().timestamp().max(0) as u64;
    let subscription = state
        .paywall(data.chain_id)?
        .subscription(data.from, data.creator, now)
        .await?;

    if !subscription.is_active {
        return Err(ApiError::Validation("No active subscription to cancel".to_string()));
    }

    info!(
        "Building cancellation of tier {} for {:?} -> {:?}",
        subscription.tier_id, data.from, data.creator
    );
    let tx = state
        .paywall_calls(data.chain_id)?
        .cancel_subscription(data.creator, subscription.tier_id)?;

    Ok(HttpResponse::Ok().json(tx))
}
