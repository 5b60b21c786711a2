use actix_web::{get, web, HttpResponse};
use ethers::types::Address;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::helpers::discovery::{discover_creator_videos, DEFAULT_PAGE_SIZE};
use crate::models::{CreatorAnalytics, CreatorEarnings, CreatorProfile};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreatorPath {
    pub address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorParams {
    chain_id: Option<u64>,
}

/// Videos, analytics and earnings of one creator. Empty for an address that never uploaded.
#[get("/{address}")]
pub async fn get_creator(
    path: web::Path<CreatorPath>,
    params: web::Query<CreatorParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;

    let videos = discover_creator_videos(&contract, path.address).await?;
    let earnings = contract.creator_earnings(path.address).await?;

    Ok(HttpResponse::Ok().json(CreatorProfile {
        creator: path.address,
        analytics: CreatorAnalytics::from_videos(&videos),
        earnings: CreatorEarnings::new(path.address, earnings),
        videos,
    }))
}

#[get("/{address}/earnings")]
pub async fn get_creator_earnings(
    path: web::Path<CreatorPath>,
    params: web::Query<CreatorParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contract = state.paywall(params.chain_id)?;
    let earnings = contract.creator_earnings(path.address).await?;

    Ok(HttpResponse::Ok().json(CreatorEarnings::new(path.address, earnings)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipsParams {
    offset: Option<u64>,
    limit: Option<u64>,
    chain_id: Option<u64>,
}

#[get("/{address}/tips")]
pub async fn get_creator_tips(
    path: web::Path<CreatorPath>,
    params: web::Query<TipsParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let tips = state
        .social(params.chain_id)?
        .creator_tips(
            path.address,
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(tips))
}

/// Tips waiting to be withdrawn from the social contract.
#[get("/{address}/tip-balance")]
pub async fn get_creator_tip_balance(
    path: web::Path<CreatorPath>,
    params: web::Query<CreatorParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let balance = state
        .social(params.chain_id)?
        .creator_tip_balance(path.address)
        .await?;

    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;

    use ethers::abi::{self, Token};
    use ethers::types::U256;

    use crate::configure_services;
    use crate::helpers::abi::uint;
    use crate::test_support::{addr, app_state, first_arg, hex_addr, uint_return, video_return, MockChain, MockPinner};

    fn chain() -> Arc<MockChain> {
        Arc::new(
            MockChain::new()
                .on("videoCount()", |_| Ok(uint_return(4)))
                .on("getVideo(uint256)", |args| match first_arg(args) {
                    1 => Ok(video_return(addr(0xaa), "QmA", 10, 30, true)),
                    2 => Ok(video_return(addr(0xbb), "QmB", 10, 99, true)),
                    3 => Ok(video_return(addr(0xaa), "", 10, 0, true)),
                    _ => Ok(video_return(addr(0xaa), "QmD", 10, 10, true)),
                })
                .on("creatorEarnings(address)", |_| {
                    Ok(uint_return(U256::from(1_500_000_000_000_000_000u64)))
                })
                .on("getCreatorTips(address,uint256,uint256)", |_| {
                    Ok(abi::encode(&[Token::Array(vec![Token::Tuple(vec![
                        Token::Address(addr(0x01)),
                        uint(1_000_000_000_000_000),
                        Token::String("keep going".to_string()),
                        uint(1_700_000_000),
                    ])])]))
                })
                .on("creatorTipBalance(address)", |_| Ok(uint_return(3_000_000_000_000_000u64))),
        )
    }

    #[actix_web::test]
    async fn profile_lists_creator_videos_with_analytics() {
        let chain = chain();
        let state = app_state(chain.clone(), Arc::new(MockPinner::pinning_as("bafy")));
        let app = test::init_service(App::new().app_data(state).configure(configure_services)).await;

        let uri = format!("/creators/{}", hex_addr(0xaa));
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let ids: Vec<u64> = body["videos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_u64().unwrap())
            .collect();

        assert_eq!(ids, vec![1, 4]);
        assert_eq!(body["analytics"]["totalVideos"], 2);
        assert_eq!(body["analytics"]["totalViews"], "40");
        assert_eq!(body["analytics"]["topVideos"], serde_json::json!([1, 4]));
        assert_eq!(body["earnings"]["earningsEth"], "1.500000");
        assert_eq!(chain.calls("getVideo(uint256)"), 4);
    }

    #[actix_web::test]
    async fn earnings_only() {
        let state = app_state(chain(), Arc::new(MockPinner::pinning_as("bafy")));
        let app = test::init_service(App::new().app_data(state).configure(configure_services)).await;

        let uri = format!("/creators/{}/earnings", hex_addr(0xaa));
        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;

        assert_eq!(body["earnings"], "1500000000000000000");
        assert_eq!(body["creator"], hex_addr(0xaa));
    }

    #[actix_web::test]
    async fn tips_and_tip_balance() {
        let state = app_state(chain(), Arc::new(MockPinner::pinning_as("bafy")));
        let app = test::init_service(App::new().app_data(state).configure(configure_services)).await;

        let uri = format!("/creators/{}/tips", hex_addr(0xaa));
        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(body[0]["tipper"], hex_addr(0x01));
        assert_eq!(body[0]["amount"], "1000000000000000");
        assert_eq!(body[0]["amountEth"], "0.001000");
        assert_eq!(body[0]["message"], "keep going");

        let uri = format!("/creators/{}/tip-balance", hex_addr(0xaa));
        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(body["balance"], "3000000000000000");
        assert_eq!(body["balanceEth"], "0.003000");
    }

    #[actix_web::test]
    async fn malformed_address_is_rejected() {
        let state = app_state(chain(), Arc::new(MockPinner::pinning_as("bafy")));
        let app = test::init_service(App::new().app_data(state).configure(configure_services)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/creators/0x1234").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
