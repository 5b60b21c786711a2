use ethers::types::Address;

use crate::errors::ApiError;
use crate::helpers::paywall::PaywallContract;
use crate::models::{Video, VideoAccess};

impl VideoAccess {
    /// The creator always watches their own video. Anyone else needs a recorded unlock.
    pub fn evaluate(video: &Video, viewer: Option<Address>, has_access: bool) -> Self {
        let is_creator = viewer.map_or(false, |v| video.exists() && v == video.creator);
        let has_unlocked = has_access && !is_creator;

        VideoAccess {
            can_watch: is_creator || has_unlocked,
            is_creator,
            has_unlocked,
        }
    }
}

pub async fn video_access(contract: &PaywallContract<'_>, video_id: u64, viewer: Option<Address>) -> Result<(Video, VideoAccess), ApiError> {
    let video = contract.get_video(video_id, viewer).await?;
    if !video.exists() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let has_access = match viewer {
        Some(viewer) => contract.has_access(video_id, viewer).await?,
        None => false,
    };

    let access = VideoAccess::evaluate(&video, viewer, has_access);
    Ok((video, access))
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;

    use super::*;
    use crate::test_support::{addr, bool_return, test_config, video_return, MockChain};

    fn video() -> Video {
        Video {
            id: 1,
            creator: addr(0xaa),
            ipfs_hash: "QmHash".to_string(),
            price: U256::from(10),
            view_count: 0,
            is_active: true,
            nft_gate: Address::zero(),
            has_viewer_access: false,
        }
    }

    #[test]
    fn creator_always_watches() {
        let access = VideoAccess::evaluate(&video(), Some(addr(0xaa)), false);
        assert_eq!(
            access,
            VideoAccess {
                can_watch: true,
                is_creator: true,
                has_unlocked: false
            }
        );

        // the contract reports the creator as having access; that isn't an unlock
        let access = VideoAccess::evaluate(&video(), Some(addr(0xaa)), true);
        assert!(access.can_watch);
        assert!(!access.has_unlocked);
    }

    #[test]
    fn buyers_watch_after_unlocking() {
        assert!(VideoAccess::evaluate(&video(), Some(addr(0x01)), true).can_watch);
        assert!(VideoAccess::evaluate(&video(), Some(addr(0x01)), true).has_unlocked);
        assert!(!VideoAccess::evaluate(&video(), Some(addr(0x01)), false).can_watch);
    }

    #[test]
    fn anonymous_viewers_cannot_watch() {
        let access = VideoAccess::evaluate(&video(), None, false);
        assert!(!access.can_watch);
        assert!(!access.is_creator);
    }

    #[actix_web::test]
    async fn reads_access_for_the_viewer() {
        let config = test_config();
        let mock = MockChain::new()
            .on("getVideo(uint256)", |_| Ok(video_return(addr(0xaa), "QmHash", 10, 0, true)))
            .on("hasAccess(uint256,address)", |_| Ok(bool_return(true)));
        let contract = PaywallContract::new(&mock, config.chain(None).unwrap()).unwrap();

        let (_, access) = video_access(&contract, 1, Some(addr(0x01))).await.unwrap();
        assert!(access.has_unlocked);
        assert_eq!(mock.senders()[0], Some(addr(0x01)));

        let (_, access) = video_access(&contract, 1, None).await.unwrap();
        assert!(!access.can_watch);
        assert_eq!(mock.calls("hasAccess(uint256,address)"), 1);
    }

    #[actix_web::test]
    async fn missing_video_is_not_found() {
        let config = test_config();
        let mock = MockChain::new().on("getVideo(uint256)", |_| Ok(video_return(Address::zero(), "", 0, 0, false)));
        let contract = PaywallContract::new(&mock, config.chain(None).unwrap()).unwrap();

        assert!(matches!(video_access(&contract, 9, None).await, Err(ApiError::NotFound(_))));
    }
}
