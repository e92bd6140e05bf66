//! Query cache with tag-based invalidation.
//!
//! Every cached query has a [`CacheKey`], and every key belongs to one
//! [`Tag`]. Mutations invalidate a whole tag, so the next read of any query
//! under it goes back to the backend.

use std::sync::Arc;
use std::time::Duration;

use feedme_core::blog::{Blog, Subscriber};
use feedme_core::meal::Meal;
use feedme_core::order::Order;
use feedme_core::review::MealReviews;
use feedme_core::user::User;
use feedme_core::{BlogId, MealId, ProviderId};
use moka::future::Cache;
use tracing::{debug, warn};

/// Invalidation group.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Tag {
    Orders,
    Meals,
    Reviews,
    Blogs,
    Newsletter,
    Users,
}

/// Cached queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Orders,
    RecentOrders,
    ProviderOrders(ProviderId),
    Meals,
    MealReviews(MealId),
    Blogs,
    Blog(BlogId),
    Subscribers,
    Users,
}

impl CacheKey {
    /// The tag this query is invalidated with.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Self::Orders | Self::RecentOrders | Self::ProviderOrders(_) => Tag::Orders,
            Self::Meals => Tag::Meals,
            Self::MealReviews(_) => Tag::Reviews,
            Self::Blogs | Self::Blog(_) => Tag::Blogs,
            Self::Subscribers => Tag::Newsletter,
            Self::Users => Tag::Users,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Orders(Arc<Vec<Order>>),
    Meals(Arc<Vec<Meal>>),
    Reviews(Arc<MealReviews>),
    Blogs(Arc<Vec<Blog>>),
    Blog(Box<Blog>),
    Subscribers(Arc<Vec<Subscriber>>),
    Users(Arc<Vec<User>>),
}

/// Shared query cache.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl QueryCache {
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, value: CacheValue) {
        self.cache.insert(key, value).await;
    }

    /// Drop every cached query under `tag`.
    pub async fn invalidate_tag(&self, tag: Tag) {
        debug!(?tag, "Invalidating cache tag");
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.tag() == tag)
        {
            warn!(?tag, error = %e, "Tag invalidation failed; clearing whole cache");
            self.cache.invalidate_all();
        }
        self.cache.run_pending_tasks().await;
    }

    /// Drop everything, e.g. on logout.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
