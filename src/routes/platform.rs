use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::helpers::fees::{calculate_fees, format_eth, parse_eth};
use crate::models::{FeeQuote, PlatformStats};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    chain_id: Option<u64>,
}

#[get("/platform")]
pub async fn get_platform_stats(params: web::Query<ChainParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;

    let (owner, platform_fee_percent, referral_fee_percent, video_count, bundle_count, platform_earnings) = futures::try_join!(
        contract.platform_owner(),
        contract.platform_fee_percent(),
        contract.referral_fee_percent(),
        contract.video_count(),
        contract.bundle_count(),
        contract.platform_earnings()
    )?;

    Ok(HttpResponse::Ok().json(PlatformStats {
        owner,
        platform_fee_percent,
        referral_fee_percent,
        video_count,
        bundle_count,
        platform_earnings,
        platform_earnings_eth: format_eth(platform_earnings, 6),
    }))
}

#[derive(Deserialize)]
pub struct FeeQuoteParams {
    /// Decimal ETH
    price: Option<String>,
}

#[get("/fees")]
pub async fn get_fee_quote(params: web::Query<FeeQuoteParams>) -> Result<HttpResponse, ApiError> {
    let price = match params.price.as_deref() {
        Some(v) => parse_eth(v)?,
        None => return Err(ApiError::MissingParameters),
    };
    let fees = calculate_fees(price);

    Ok(HttpResponse::Ok().json(FeeQuote {
        price,
        price_eth: format_eth(price, 6),
        platform_fee_eth: format_eth(fees.platform_fee, 6),
        creator_earning_eth: format_eth(fees.creator_earning, 6),
        fees,
    }))
}

#[derive(Deserialize)]
pub struct BundlePath {
    pub bundle_id: u64,
}

#[get("/bundles/{bundle_id}")]
pub async fn get_bundle(
    path: web::Path<BundlePath>,
    params: web::Query<ChainParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let bundle = contract.get_bundle(path.bundle_id).await?;

    if bundle.creator.is_zero() {
        return Err(ApiError::NotFound("Bundle not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(bundle))
}

#[derive(Deserialize)]
pub struct ReferralPath {
    pub code: String,
}

#[get("/referrals/{code}")]
pub async fn get_referral_stats(
    path: web::Path<ReferralPath>,
    params: web::Query<ChainParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let stats = contract.get_referral_stats(&path.code).await?;

    if stats.referrer.is_zero() {
        return Err(ApiError::NotFound("Referral code not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(stats))
}
