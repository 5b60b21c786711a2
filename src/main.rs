use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use ethers::types::Address;
use log::{info, warn};

use crate::config::Config;
use crate::errors::ApiError;
use crate::helpers::cache::VideoCache;
use crate::helpers::chain::{ChainReader, RpcClient};
use crate::helpers::contract::CallBuilder;
use crate::helpers::paywall::PaywallContract;
use crate::helpers::pinata::{PinataClient, Pinner};
use crate::helpers::social::SocialContract;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
#[cfg(test)]
mod test_support;

pub struct AppState {
    pub config: Config,
    pub chain: Arc<dyn ChainReader>,
    pub pinner: Arc<dyn Pinner>,
    pub cache: VideoCache,
}

impl AppState {
    /// The configured paywall contract on `chain_id` (or the default chain), reads cached.
    pub fn paywall(&self, chain_id: Option<u64>) -> Result<PaywallContract<'_>, ApiError> {
        let chain = self.config.chain(chain_id)?;
        Ok(PaywallContract::new(self.chain.as_ref(), chain)?.with_cache(&self.cache))
    }

    /// A paywall contract at a caller-supplied address.
    pub fn paywall_at(&self, chain_id: Option<u64>, address: Address) -> Result<PaywallContract<'_>, ApiError> {
        let chain = self.config.chain(chain_id)?;
        Ok(PaywallContract::at(self.chain.as_ref(), chain, address).with_cache(&self.cache))
    }

    pub fn paywall_calls(&self, chain_id: Option<u64>) -> Result<CallBuilder, ApiError> {
        CallBuilder::paywall(self.config.chain(chain_id)?)
    }

    pub fn social_calls(&self, chain_id: Option<u64>) -> Result<CallBuilder, ApiError> {
        CallBuilder::social(self.config.chain(chain_id)?)
    }

    pub fn social(&self, chain_id: Option<u64>) -> Result<SocialContract<'_>, ApiError> {
        SocialContract::new(self.chain.as_ref(), self.config.chain(chain_id)?)
    }
}

/// Extractor failures answer with the same `{"error": ..}` body as everything else.
fn extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| ApiError::Validation(err.to_string()).into()))
        .app_data(web::PathConfig::default().error_handler(|err, _req| ApiError::Validation(err.to_string()).into()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| ApiError::Validation(err.to_string()).into()));
}

pub fn configure_services(cfg: &mut web::ServiceConfig) {
    extractor_errors(cfg);

    cfg.service(
        web::scope("/api")
            .service(routes::video::get_video_record)
    )
        .service(
            web::scope("/video")
                .service(routes::video::get_videos)
                .service(routes::video::get_video_access)
                .service(routes::video::get_video)
        )
        .service(
            web::scope("/upload")
                .route("", web::post().to(routes::upload::upload_video))
                .route("/direct", web::post().to(routes::upload::upload_video_direct))
        )
        .service(
            web::scope("/creators")
                .service(routes::creators::get_creator_earnings)
                .service(routes::creators::get_creator_tips)
                .service(routes::creators::get_creator_tip_balance)
                .service(routes::creators::get_creator)
        )
        .service(routes::platform::get_platform_stats)
        .service(routes::platform::get_fee_quote)
        .service(routes::platform::get_bundle)
        .service(routes::platform::get_referral_stats)
        .service(
            web::scope("/subscriptions")
                .service(routes::subscriptions::get_tiers)
                .service(routes::subscriptions::get_tier)
                .service(routes::subscriptions::get_subscription_status)
        )
        .service(
            web::scope("/tx")
                .service(routes::transactions::upload_video)
                .service(routes::transactions::unlock_video)
                .service(routes::transactions::deactivate_video)
                .service(routes::transactions::send_tip)
                .service(routes::transactions::create_bundle)
                .service(routes::transactions::purchase_bundle)
                .service(routes::transactions::create_referral_code)
                .service(routes::transactions::withdraw_earnings)
                .service(routes::transactions::withdraw_platform_fees)
                .service(routes::subscriptions::create_tier)
                .service(routes::subscriptions::subscribe)
                .service(routes::subscriptions::cancel_subscription)
                .service(routes::transactions::get_transaction_status)
        )
        .service(
            web::scope("/comments")
                .service(routes::comments::create_comment)
                .service(routes::comments::like_comment)
                .service(routes::comments::delete_comment)
                .service(routes::comments::withdraw_tips)
                .service(routes::comments::get_comments)
        );
}

fn startup_error(e: ApiError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    if config.pinata_jwt.is_none() {
        warn!("PINATA_JWT not set, server uploads will ask clients for their own token");
    }

    let chain = RpcClient::new(&config.chains).map_err(startup_error)?;
    let pinner = PinataClient::new(&config.pinata_api_url).map_err(startup_error)?;
    let bind_address = config.bind_address.clone();

    let state = web::Data::new(AppState {
        cache: VideoCache::new(config.video_cache_ttl, config.video_cache_capacity),
        config,
        chain: Arc::new(chain),
        pinner: Arc::new(pinner),
    });

    info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_services)
    })
        .bind(bind_address)?
        .run()
        .await
}
