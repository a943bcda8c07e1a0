//! Short link creation, lookup and deletion with a cache in front of the store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::{AppError, StoreError};
use crate::infrastructure::cache::CacheService;
use crate::utils::short_code::short_code_for;
use crate::utils::url_validator::validate_url;

/// Cache key for the JSON-encoded link behind `short_code`.
pub fn code_cache_key(short_code: &str) -> String {
    format!("code:{}", short_code)
}

/// Cache key for the id of the link `user_id` owns for `original_url`.
///
/// Scoped by owner so a cached id can never hand one user another user's link.
pub fn url_cache_key(user_id: Option<i64>, original_url: &str) -> String {
    match user_id {
        Some(id) => format!("url:{}:{}", id, original_url),
        None => format!("url:anon:{}", original_url),
    }
}

/// Service owning the dedupe and cache-aside logic for short links.
///
/// The store's unique constraints are the only concurrency control: a create
/// that loses a race is resolved by re-reading the winner, never by locking.
/// The cache holds reconstructible copies only; every cache failure degrades
/// to a store read.
pub struct ShortenerService<L: LinkRepository + ?Sized = dyn LinkRepository> {
    links: Arc<L>,
    cache: Arc<dyn CacheService>,
    cache_ttl: Duration,
}

impl<L: LinkRepository + ?Sized> ShortenerService<L> {
    /// Creates a new shortener service.
    pub fn new(links: Arc<L>, cache: Arc<dyn CacheService>, cache_ttl: Duration) -> Self {
        Self {
            links,
            cache,
            cache_ttl,
        }
    }

    /// Returns the canonical short link for `(user_id, original_url)`,
    /// creating it on first use.
    ///
    /// Lookup order: cached id (confirmed against the store), then the store,
    /// then an insert. A unique violation on insert means a concurrent request
    /// or a digest collision got there first; the owner lookup is retried once.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] if the URL is not an absolute http(s) URL
    /// - [`AppError::CreateFailed`] if the insert fails and no existing link
    ///   for this owner and URL can be found
    /// - [`AppError::StoreUnavailable`] if a lookup fails
    pub async fn shorten(
        &self,
        user_id: Option<i64>,
        original_url: &str,
    ) -> Result<ShortLink, AppError> {
        validate_url(original_url).map_err(|e| {
            AppError::invalid_input(
                "Invalid URL",
                json!({ "url": original_url, "reason": e.to_string() }),
            )
        })?;

        if let Some(link) = self.cached_owned_link(user_id, original_url).await? {
            debug!(short_code = %link.short_code, "Shorten served from cache");
            return Ok(link);
        }

        if let Some(link) = self
            .links
            .find_by_owner_and_url(user_id, original_url)
            .await?
        {
            self.cache_link(&link).await;
            return Ok(link);
        }

        let short_code = short_code_for(original_url);
        let new_link = NewShortLink {
            user_id,
            original_url: original_url.to_string(),
            short_code: short_code.clone(),
        };

        let link = match self.links.create(new_link).await {
            Ok(link) => {
                info!(id = link.id, short_code = %link.short_code, "Short link created");
                link
            }
            Err(StoreError::UniqueViolation(field)) => {
                debug!(%field, short_code = %short_code, "Create conflicted, re-reading");

                match self
                    .links
                    .find_by_owner_and_url(user_id, original_url)
                    .await?
                {
                    Some(link) => link,
                    None => {
                        warn!(%field, short_code = %short_code, "Short code held by another link");
                        return Err(AppError::create_failed(
                            "Short code collision",
                            json!({ "short_code": short_code, "constraint": field.to_string() }),
                        ));
                    }
                }
            }
            Err(e) => {
                return Err(AppError::create_failed(
                    "Failed to create short link",
                    json!({ "reason": e.to_string() }),
                ));
            }
        };

        self.cache_link(&link).await;
        Ok(link)
    }

    /// Resolves a short code, cache first.
    ///
    /// A miss costs exactly one store lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    pub async fn resolve(&self, short_code: &str) -> Result<ShortLink, AppError> {
        let key = code_cache_key(short_code);

        if let Some(raw) = self.cache_get(&key).await {
            match serde_json::from_str::<ShortLink>(&raw) {
                Ok(link) => return Ok(link),
                Err(e) => warn!(key = %key, error = %e, "Undecodable cache entry, ignoring"),
            }
        }

        let link = self
            .links
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "short_code": short_code }))
            })?;

        if let Ok(encoded) = serde_json::to_string(&link) {
            self.cache_set(&key, &encoded).await;
        }

        Ok(link)
    }

    /// Deletes a link and evicts both of its cache entries.
    ///
    /// Eviction failures are logged; TTL expiry bounds the staleness they leave.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let link = self.get_by_id(id).await?;

        if !self.links.delete(id).await? {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "id": id }),
            ));
        }

        self.cache_delete(&code_cache_key(&link.short_code)).await;
        self.cache_delete(&url_cache_key(link.user_id, &link.original_url))
            .await;

        info!(id, short_code = %link.short_code, "Short link deleted");
        Ok(())
    }

    /// Lists every link owned by `user_id`. Not cached.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<ShortLink>, AppError> {
        Ok(self.links.list_by_user(user_id).await?)
    }

    /// Fetches a link by id. Not cached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<ShortLink, AppError> {
        self.links
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))
    }

    /// Returns the cached link for this owner and URL, if the store confirms it.
    async fn cached_owned_link(
        &self,
        user_id: Option<i64>,
        original_url: &str,
    ) -> Result<Option<ShortLink>, AppError> {
        let key = url_cache_key(user_id, original_url);

        let Some(raw) = self.cache_get(&key).await else {
            return Ok(None);
        };

        let Ok(id) = raw.parse::<i64>() else {
            warn!(key = %key, "Cached link id is not an integer, ignoring");
            return Ok(None);
        };

        // The cached id may outlive the row it points at.
        match self.links.find_by_id(id).await? {
            Some(link) if link.is_owned_link_for(user_id, original_url) => Ok(Some(link)),
            _ => {
                debug!(key = %key, id, "Stale cache entry");
                Ok(None)
            }
        }
    }

    async fn cache_link(&self, link: &ShortLink) {
        if let Ok(encoded) = serde_json::to_string(link) {
            self.cache_set(&code_cache_key(&link.short_code), &encoded)
                .await;
        }
        self.cache_set(
            &url_cache_key(link.user_id, &link.original_url),
            &link.id.to_string(),
        )
        .await;
    }

    async fn cache_get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(Some(value)) => {
                debug!(key, "Cache HIT");
                metrics::counter!("shortener_cache_hits_total").increment(1);
                Some(value)
            }
            Ok(None) => {
                debug!(key, "Cache MISS");
                metrics::counter!("shortener_cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                metrics::counter!("shortener_cache_misses_total").increment(1);
                None
            }
        }
    }

    async fn cache_set(&self, key: &str, value: &str) {
        if let Err(e) = self.cache.set(key, value, self.cache_ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    async fn cache_delete(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "Cache eviction failed");
        }
    }
}
