use actix_web::{get, web, HttpResponse};
use ethers::types::Address;
use log::error;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::helpers::abi::parse_address;
use crate::helpers::access::video_access;
use crate::helpers::discovery::{list_videos, DEFAULT_PAGE_SIZE};
use crate::helpers::fees::{calculate_fees, format_eth};
use crate::helpers::ipfs::{ipfs_url, Gateway};
use crate::models::VideoDetails;
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVideoRecordParams {
    video_id: Option<String>,
    contract_address: Option<String>,
    chain_id: Option<u64>,
    viewer: Option<Address>,
}

/// Raw video record from a caller-named contract.
#[get("/get-video")]
pub async fn get_video_record(params: web::Query<GetVideoRecordParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (video_id, contract_address) = match (&params.video_id, &params.contract_address) {
        (Some(v), Some(c)) if !v.trim().is_empty() && !c.trim().is_empty() => (v.trim(), c.trim()),
        _ => return Err(ApiError::MissingParameters),
    };

    let video_id: u64 = video_id
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid video id: {}", video_id)))?;
    let contract_address = parse_address(contract_address)?;

    let contract = state.paywall_at(params.chain_id, contract_address)?;

    match contract.get_video(video_id, params.viewer).await {
        Ok(video) => Ok(HttpResponse::Ok().json(video)),
        Err(e) => {
            error!("Error fetching video {} from {:?}: {}", video_id, contract_address, e);
            Err(ApiError::Internal("Failed to fetch video".to_string()))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVideosParams {
    offset: Option<u64>,
    limit: Option<u64>,
    chain_id: Option<u64>,
}

#[get("")]
pub async fn get_videos(params: web::Query<GetVideosParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let page = list_videos(
        &contract,
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;

    Ok(HttpResponse::Ok().json(page))
}

#[derive(Deserialize)]
pub struct GetVideoPath {
    pub video_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVideoParams {
    chain_id: Option<u64>,
    viewer: Option<Address>,
    #[serde(default)]
    gateway: Gateway,
}

#[get("/{video_id}")]
pub async fn get_video(
    path: web::Path<GetVideoPath>,
    params: web::Query<GetVideoParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let video = contract.get_video(path.video_id, params.viewer).await?;

    if !video.exists() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let details = VideoDetails {
        gateway_url: ipfs_url(Some(&video.ipfs_hash), params.gateway),
        nft_gated: video.is_nft_gated(),
        price_eth: format_eth(video.price, 6),
        fees: calculate_fees(video.price),
        video,
    };

    Ok(HttpResponse::Ok().json(details))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVideoAccessParams {
    chain_id: Option<u64>,
    viewer: Option<Address>,
}

#[get("/{video_id}/access")]
pub async fn get_video_access(
    path: web::Path<GetVideoPath>,
    params: web::Query<GetVideoAccessParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let (_, access) = video_access(&contract, path.video_id, params.viewer).await?;

    Ok(HttpResponse::Ok().json(access))
}
