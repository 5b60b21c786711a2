use ethers::types::Address;
use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::errors::ApiError;
use crate::helpers::paywall::PaywallContract;
use crate::models::{CreatorAnalytics, Video, VideoPage};

/// Lookups kept in flight at once during a scan.
const CONCURRENT_LOOKUPS: usize = 8;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 50;

const TOP_VIDEO_COUNT: usize = 5;

/// Reads ids in `ids` in order. A failed lookup is logged and left out.
async fn scan(contract: &PaywallContract<'_>, ids: std::ops::RangeInclusive<u64>) -> Vec<Video> {
    stream::iter(ids)
        .map(|id| async move { (id, contract.get_video(id, None).await) })
        .buffered(CONCURRENT_LOOKUPS)
        .filter_map(|(id, result)| async move {
            match result {
                Ok(video) => Some(video),
                Err(e) => {
                    warn!("Skipping video {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
        .await
}

/// Every video uploaded by `creator`. Ids run from 1 to `videoCount`, one lookup each.
pub async fn discover_creator_videos(contract: &PaywallContract<'_>, creator: Address) -> Result<Vec<Video>, ApiError> {
    let count = contract.video_count().await?;
    debug!("Scanning {} videos for {:?}", count, creator);

    let videos = scan(contract, 1..=count)
        .await
        .into_iter()
        .filter(|video| video.creator == creator && video.has_content())
        .collect();

    Ok(videos)
}

/// A window of active videos in id order, for the home page.
pub async fn list_videos(contract: &PaywallContract<'_>, offset: u64, limit: u64) -> Result<VideoPage, ApiError> {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let total = contract.video_count().await?;

    let first = offset.saturating_add(1);
    let last = offset.saturating_add(limit).min(total);

    let videos = if first > last {
        Vec::new()
    } else {
        scan(contract, first..=last)
            .await
            .into_iter()
            .filter(|video| video.exists() && video.is_active && video.has_content())
            .collect()
    };

    Ok(VideoPage {
        videos,
        total,
        offset,
        limit,
    })
}

impl CreatorAnalytics {
    pub fn from_videos(videos: &[Video]) -> Self {
        let total_views: u64 = videos.iter().map(|v| v.view_count).sum();
        let avg_views_per_video = if videos.is_empty() {
            0.0
        } else {
            total_views as f64 / videos.len() as f64
        };

        let mut ranked: Vec<&Video> = videos.iter().collect();
        ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count).then(a.id.cmp(&b.id)));

        CreatorAnalytics {
            total_videos: videos.len(),
            total_views,
            avg_views_per_video,
            top_videos: ranked.iter().take(TOP_VIDEO_COUNT).map(|v| v.id).collect(),
        }
    }
}
