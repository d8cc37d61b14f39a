pub mod client;
pub mod entities;
pub mod error;

use self::entities::Snapshot;
use self::error::FeedResult;

/// Anything that can produce the current snapshot of active vehicles
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch(&self) -> FeedResult<Snapshot>;
}
