use std::ops::DerefMut;
use std::time::Duration;

use diesel::r2d2;
use log::{debug, warn};
use r2d2_redis::redis::{self, Commands};
use r2d2_redis::RedisConnectionManager;

use crate::config::{CACHE_POOL_EXPIRE_SECONDS, CACHE_POOL_MAX_OPEN, CACHE_POOL_MIN_IDLE};
use crate::error::ServiceError;
use crate::models::IngredientListing;

pub(crate) type RedisPool = r2d2::Pool<RedisConnectionManager>;

const LISTING_PREFIX: &str = "ingredients";

/// Redis cache of ingredient listings, one entry per visibility scope so a
/// user's own ingredients are never served to anybody else.
///
/// Every failure is logged and treated as a miss; the database stays the
/// source of truth.
#[derive(Clone)]
pub(crate) struct ListingCache {
    pool: Option<RedisPool>,
    ttl_seconds: u64,
}

impl ListingCache {
    pub(crate) fn disabled() -> Self {
        Self {
            pool: None,
            ttl_seconds: 0,
        }
    }

    pub(crate) fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self, ServiceError> {
        let manager = RedisConnectionManager::new(redis_url)
            .map_err(|e| ServiceError::Config(format!("invalid REDIS_URL: {e}")))?;
        let pool = r2d2::Pool::builder()
            .max_size(CACHE_POOL_MAX_OPEN)
            .max_lifetime(Some(Duration::from_secs(CACHE_POOL_EXPIRE_SECONDS)))
            .min_idle(Some(CACHE_POOL_MIN_IDLE))
            .build_unchecked(manager);
        Ok(Self {
            pool: Some(pool),
            ttl_seconds,
        })
    }

    pub(crate) fn scope_key(viewer: Option<i32>) -> String {
        match viewer {
            Some(user) => format!("{LISTING_PREFIX}:user:{user}"),
            None => format!("{LISTING_PREFIX}:global"),
        }
    }

    pub(crate) fn get(&self, viewer: Option<i32>) -> Option<Vec<IngredientListing>> {
        let pool = self.pool.as_ref()?;
        let key = Self::scope_key(viewer);
        let result = pool
            .get()
            .map_err(|e| ServiceError::Cache(e.to_string()))
            .and_then(|mut conn| {
                conn.deref_mut()
                    .get::<_, Option<Vec<u8>>>(&key)
                    .map_err(|e| ServiceError::Cache(e.to_string()))
            });
        match result {
            Ok(Some(bytes)) => match decode_listings(&bytes) {
                Ok(listings) => {
                    debug!("cache hit for {key}");
                    Some(listings)
                }
                Err(e) => {
                    warn!("dropping unreadable cache entry {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("cache lookup for {key} failed: {e}");
                None
            }
        }
    }

    pub(crate) fn put(&self, viewer: Option<i32>, listings: &[IngredientListing]) {
        let Some(pool) = self.pool.as_ref() else {
            return;
        };
        let key = Self::scope_key(viewer);
        let result = encode_listings(listings).and_then(|bytes| {
            let mut conn = pool.get().map_err(|e| ServiceError::Cache(e.to_string()))?;
            conn.deref_mut()
                .set_ex::<_, _, ()>(&key, bytes, self.ttl_seconds as usize)
                .map_err(|e| ServiceError::Cache(e.to_string()))
        });
        if let Err(e) = result {
            warn!("could not cache {key}: {e}");
        }
    }

    /// Drops every listing scope. A change to a global ingredient shows up in
    /// all of them.
    pub(crate) fn invalidate(&self) {
        let Some(pool) = self.pool.as_ref() else {
            return;
        };
        let result = pool
            .get()
            .map_err(|e| ServiceError::Cache(e.to_string()))
            .and_then(|mut conn| {
                let conn = conn.deref_mut();
                let keys: Vec<String> = redis::cmd("KEYS")
                    .arg(format!("{LISTING_PREFIX}:*"))
                    .query(conn)
                    .map_err(|e| ServiceError::Cache(e.to_string()))?;
                if !keys.is_empty() {
                    conn.del::<_, ()>(keys)
                        .map_err(|e| ServiceError::Cache(e.to_string()))?;
                }
                Ok(())
            });
        if let Err(e) = result {
            warn!("could not invalidate ingredient listings: {e}");
        }
    }
}

fn encode_listings(listings: &[IngredientListing]) -> Result<Vec<u8>, ServiceError> {
    bincode::serialize(listings).map_err(|e| ServiceError::Cache(e.to_string()))
}

fn decode_listings(bytes: &[u8]) -> Result<Vec<IngredientListing>, ServiceError> {
    bincode::deserialize(bytes).map_err(|e| ServiceError::Cache(e.to_string()))
}
