use ethers::abi::{ParamType, Token};
use ethers::types::{Address, Bytes, U256};
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::config::ChainConfig;
use crate::errors::ApiError;
use crate::helpers::abi::{decode_output, encode_call, to_u64, uint};
use crate::helpers::cache::VideoCache;
use crate::helpers::chain::ChainReader;
use crate::models::{Bundle, ReferralStats, Subscription, SubscriptionTiers, Tier, Video};

const CONCURRENT_TIER_LOOKUPS: usize = 8;

/// Typed view functions of the paywall contract.
pub struct PaywallContract<'a> {
    reader: &'a dyn ChainReader,
    chain: &'a ChainConfig,
    address: Address,
    cache: Option<&'a VideoCache>,
}

impl<'a> PaywallContract<'a> {
    /// The contract configured for `chain`.
    pub fn new(reader: &'a dyn ChainReader, chain: &'a ChainConfig) -> Result<Self, ApiError> {
        Ok(Self::at(reader, chain, chain.paywall()?))
    }

    /// A contract at an explicit address, e.g. one named by the caller.
    pub fn at(reader: &'a dyn ChainReader, chain: &'a ChainConfig, address: Address) -> Self {
        PaywallContract {
            reader,
            chain,
            address,
            cache: None,
        }
    }

    /// Viewer-independent `get_video` reads go through `cache`.
    pub fn with_cache(mut self, cache: &'a VideoCache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn read(&self, signature: &str, args: &[Token], from: Option<Address>) -> Result<Bytes, ApiError> {
        self.reader
            .call(self.chain, self.address, encode_call(signature, args), from)
            .await
    }

    async fn read_uint(&self, signature: &str, args: &[Token]) -> Result<U256, ApiError> {
        let data = self.read(signature, args, None).await?;
        decode_output(&[ParamType::Uint(256)], &data)
    }

    async fn read_bool(&self, signature: &str, args: &[Token]) -> Result<bool, ApiError> {
        let data = self.read(signature, args, None).await?;
        decode_output(&[ParamType::Bool], &data)
    }

    /// With a `viewer` the record carries their access flag, so it is always read live.
    pub async fn get_video(&self, id: u64, viewer: Option<Address>) -> Result<Video, ApiError> {
        let cache = self.cache.filter(|_| viewer.is_none());
        let key = (self.chain.id, self.address, id);

        if let Some(video) = cache.and_then(|cache| cache.get(&key)) {
            return Ok(video);
        }

        let data = self.read("getVideo(uint256)", &[uint(id)], viewer).await?;
        let (creator, ipfs_hash, price, view_count, is_active, nft_gate, has_viewer_access): (
            Address,
            String,
            U256,
            U256,
            bool,
            Address,
            bool,
        ) = decode_output(
            &[
                ParamType::Address,
                ParamType::String,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Bool,
                ParamType::Address,
                ParamType::Bool,
            ],
            &data,
        )?;

        let video = Video {
            id,
            creator,
            ipfs_hash,
            price,
            view_count: to_u64(view_count)?,
            is_active,
            nft_gate,
            has_viewer_access,
        };

        if let Some(cache) = cache {
            if video.exists() {
                cache.insert(key, video.clone());
            }
        }

        Ok(video)
    }

    pub async fn video_count(&self) -> Result<u64, ApiError> {
        to_u64(self.read_uint("videoCount()", &[]).await?)
    }

    pub async fn bundle_count(&self) -> Result<u64, ApiError> {
        to_u64(self.read_uint("bundleCount()", &[]).await?)
    }

    pub async fn has_access(&self, video_id: u64, viewer: Address) -> Result<bool, ApiError> {
        self.read_bool("hasAccess(uint256,address)", &[uint(video_id), Token::Address(viewer)])
            .await
    }

    pub async fn get_bundle(&self, id: u64) -> Result<Bundle, ApiError> {
        let data = self.read("getBundle(uint256)", &[uint(id)], None).await?;
        let (creator, video_ids, price, name, is_active): (Address, Vec<U256>, U256, String, bool) = decode_output(
            &[
                ParamType::Address,
                ParamType::Array(Box::new(ParamType::Uint(256))),
                ParamType::Uint(256),
                ParamType::String,
                ParamType::Bool,
            ],
            &data,
        )?;

        Ok(Bundle {
            id,
            creator,
            video_ids: video_ids.into_iter().map(to_u64).collect::<Result<_, _>>()?,
            price,
            name,
            is_active,
        })
    }

    pub async fn get_referral_stats(&self, code: &str) -> Result<ReferralStats, ApiError> {
        let data = self
            .read("getReferralStats(string)", &[Token::String(code.to_string())], None)
            .await?;
        let (referrer, earnings, referral_count): (Address, U256, U256) =
            decode_output(&[ParamType::Address, ParamType::Uint(256), ParamType::Uint(256)], &data)?;

        Ok(ReferralStats {
            code: code.to_string(),
            referrer,
            earnings,
            referral_count: to_u64(referral_count)?,
        })
    }

    pub async fn creator_earnings(&self, creator: Address) -> Result<U256, ApiError> {
        self.read_uint("creatorEarnings(address)", &[Token::Address(creator)])
            .await
    }

    pub async fn platform_earnings(&self) -> Result<U256, ApiError> {
        self.read_uint("platformEarnings()", &[]).await
    }

    pub async fn platform_owner(&self) -> Result<Address, ApiError> {
        let data = self.read("platformOwner()", &[], None).await?;
        decode_output(&[ParamType::Address], &data)
    }

    pub async fn platform_fee_percent(&self) -> Result<U256, ApiError> {
        self.read_uint("platformFeePercent()", &[]).await
    }

    pub async fn referral_fee_percent(&self) -> Result<U256, ApiError> {
        self.read_uint("referralFeePercent()", &[]).await
    }

    pub async fn creator_tier(&self, creator: Address, tier_id: u64) -> Result<Tier, ApiError> {
        let data = self
            .read(
                "creatorTiers(address,uint256)",
                &[Token::Address(creator), uint(tier_id)],
                None,
            )
            .await?;
        let (price, name, is_active): (U256, String, bool) =
            decode_output(&[ParamType::Uint(256), ParamType::String, ParamType::Bool], &data)?;

        Ok(Tier {
            creator,
            tier_id,
            price,
            name,
            is_active,
        })
    }

    pub async fn creator_tier_count(&self, creator: Address) -> Result<u64, ApiError> {
        to_u64(
            self.read_uint("creatorTierCount(address)", &[Token::Address(creator)])
                .await?,
        )
    }

    /// Tiers `1..=creatorTierCount`, in id order. Slots that were never filled are left out.
    pub async fn creator_tiers(&self, creator: Address) -> Result<SubscriptionTiers, ApiError> {
        let tier_count = self.creator_tier_count(creator).await?;

        let tiers: Vec<Tier> = stream::iter(1..=tier_count)
            .map(|tier_id| self.creator_tier(creator, tier_id))
            .buffered(CONCURRENT_TIER_LOOKUPS)
            .try_filter(|tier| futures::future::ready(!(tier.price.is_zero() && tier.name.is_empty())))
            .try_collect()
            .await?;

        Ok(SubscriptionTiers {
            creator,
            tier_count,
            tiers,
        })
    }

    pub async fn has_active_subscription(&self, subscriber: Address, creator: Address) -> Result<bool, ApiError> {
        self.read_bool(
            "hasActiveSubscription(address,address)",
            &[Token::Address(subscriber), Token::Address(creator)],
        )
        .await
    }

    /// `now` is a unix timestamp in seconds, used to flag lapsed subscriptions.
    pub async fn subscription(&self, subscriber: Address, creator: Address, now: u64) -> Result<Subscription, ApiError> {
        let data = self
            .read(
                "subscriptions(address,address)",
                &[Token::Address(subscriber), Token::Address(creator)],
                None,
            )
            .await?;
        let (tier_id, expires_at): (U256, U256) = decode_output(&[ParamType::Uint(256), ParamType::Uint(256)], &data)?;
        let expires_at = to_u64(expires_at)?;

        Ok(Subscription {
            subscriber,
            creator,
            tier_id: to_u64(tier_id)?,
            expires_at,
            is_active: self.has_active_subscription(subscriber, creator).await?,
            is_expired: expires_at != 0 && expires_at <= now,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ethers::abi;

    use super::*;
    use crate::config::BASE_CHAIN_ID;
    use crate::test_support::{addr, arg, bool_return, test_config, uint_return, video_return, video_return_for, MockChain};

    #[actix_web::test]
    async fn decodes_get_video() {
        let config = test_config();
        let chain = config.chain(Some(BASE_CHAIN_ID)).unwrap();
        let mock = MockChain::new().on("getVideo(uint256)", |_| Ok(video_return(addr(0xaa), "QmHash", 5, 3, true)));

        let contract = PaywallContract::new(&mock, chain).unwrap();
        let video = contract.get_video(7, None).await.unwrap();

        assert_eq!(video.id, 7);
        assert_eq!(video.creator, addr(0xaa));
        assert_eq!(video.ipfs_hash, "QmHash");
        assert_eq!(video.price, U256::from(5));
        assert_eq!(video.view_count, 3);
        assert!(video.is_active);
        assert!(!video.is_nft_gated());
    }

    #[actix_web::test]
    async fn prices_past_128_bits_decode() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let price = U256::from(u128::MAX) * U256::from(1_000);
        let mock = MockChain::new().on("getVideo(uint256)", move |_| {
            Ok(video_return_for(addr(0xaa), "QmHash", price, 0, true, false))
        });

        let video = PaywallContract::new(&mock, chain).unwrap().get_video(1, None).await.unwrap();
        assert_eq!(video.price, price);
    }

    #[actix_web::test]
    async fn cached_reads_skip_the_node() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let cache = VideoCache::new(Duration::from_secs(60), 16);
        let mock = MockChain::new().on("getVideo(uint256)", |_| Ok(video_return(addr(0xaa), "QmHash", 5, 3, true)));

        let contract = PaywallContract::new(&mock, chain).unwrap().with_cache(&cache);
        contract.get_video(1, None).await.unwrap();
        contract.get_video(1, None).await.unwrap();

        assert_eq!(mock.calls("getVideo(uint256)"), 1);
    }

    #[actix_web::test]
    async fn viewer_reads_bypass_the_cache() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let cache = VideoCache::new(Duration::from_secs(60), 16);
        let mock = MockChain::new().on("getVideo(uint256)", |_| Ok(video_return(addr(0xaa), "QmHash", 5, 3, true)));

        let contract = PaywallContract::new(&mock, chain).unwrap().with_cache(&cache);
        contract.get_video(1, Some(addr(0x01))).await.unwrap();
        contract.get_video(1, Some(addr(0x01))).await.unwrap();

        assert_eq!(mock.calls("getVideo(uint256)"), 2);
        assert_eq!(cache.len(), 0);
    }

    #[actix_web::test]
    async fn decodes_bundle_and_referral_stats() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let mock = MockChain::new()
            .on("getBundle(uint256)", |_| {
                Ok(abi::encode(&[
                    Token::Address(addr(0xaa)),
                    Token::Array(vec![uint(1), uint(4)]),
                    uint(900),
                    Token::String("Starter pack".to_string()),
                    Token::Bool(true),
                ]))
            })
            .on("getReferralStats(string)", |_| {
                Ok(abi::encode(&[Token::Address(addr(0xbb)), uint(42), uint(3)]))
            });

        let contract = PaywallContract::new(&mock, chain).unwrap();

        let bundle = contract.get_bundle(2).await.unwrap();
        assert_eq!(bundle.video_ids, vec![1, 4]);
        assert_eq!(bundle.name, "Starter pack");
        assert_eq!(bundle.price, U256::from(900));

        let stats = contract.get_referral_stats("friends").await.unwrap();
        assert_eq!(stats.referrer, addr(0xbb));
        assert_eq!(stats.earnings, U256::from(42));
        assert_eq!(stats.referral_count, 3);
    }

    #[actix_web::test]
    async fn subscription_flags_lapsed_expiry() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let mock = MockChain::new()
            .on("subscriptions(address,address)", |_| Ok(abi::encode(&[uint(1), uint(1_000)])))
            .on("hasActiveSubscription(address,address)", |_| Ok(bool_return(false)));

        let contract = PaywallContract::new(&mock, chain).unwrap();
        let subscription = contract.subscription(addr(0x01), addr(0x02), 2_000).await.unwrap();

        assert_eq!(subscription.tier_id, 1);
        assert!(!subscription.is_active);
        assert!(subscription.is_expired);
    }

    #[actix_web::test]
    async fn tier_listing_skips_empty_slots() {
        let config = test_config();
        let chain = config.chain(None).unwrap();
        let mock = MockChain::new()
            .on("creatorTierCount(address)", |_| Ok(uint_return(3)))
            .on("creatorTiers(address,uint256)", |args| match arg(args, 1) {
                1 => Ok(abi::encode(&[uint(1_000), Token::String("Fan".to_string()), Token::Bool(true)])),
                3 => Ok(abi::encode(&[uint(5_000), Token::String("Patron".to_string()), Token::Bool(false)])),
                _ => Ok(abi::encode(&[uint(0), Token::String(String::new()), Token::Bool(false)])),
            });

        let listing = PaywallContract::new(&mock, chain)
            .unwrap()
            .creator_tiers(addr(0xaa))
            .await
            .unwrap();

        assert_eq!(listing.tier_count, 3);
        assert_eq!(listing.tiers.iter().map(|t| t.tier_id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(listing.tiers[1].name, "Patron");
        assert_eq!(mock.calls("creatorTiers(address,uint256)"), 3);
    }
}
