//! Blog endpoints.

use std::sync::Arc;

use feedme_core::BlogId;
use feedme_core::blog::{Blog, BlogDraft};
use tracing::{debug, instrument};

use super::segment;
use crate::cache::{CacheKey, CacheValue, Tag};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

impl ApiClient {
    /// All published posts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn blogs(&self) -> Result<Arc<Vec<Blog>>, ApiError> {
        if let Some(CacheValue::Blogs(blogs)) = self.cache().get(&CacheKey::Blogs).await {
            debug!("Cache hit");
            return Ok(blogs);
        }

        let blogs = Arc::new(
            self.fetch(&ApiRequest::get("blogs/all-blogs"))
                .await?
                .into_list::<Blog>()?,
        );
        self.cache()
            .insert(CacheKey::Blogs, CacheValue::Blogs(Arc::clone(&blogs)))
            .await;
        Ok(blogs)
    }

    /// One post.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids, or another `ApiError` if
    /// the request fails.
    #[instrument(skip(self), fields(blog_id = %id))]
    pub async fn blog(&self, id: &BlogId) -> Result<Blog, ApiError> {
        let key = CacheKey::Blog(id.clone());
        if let Some(CacheValue::Blog(blog)) = self.cache().get(&key).await {
            debug!("Cache hit");
            return Ok(*blog);
        }

        let path = format!("blogs/{}", segment(id.as_str()));
        let blog: Blog = self.fetch(&ApiRequest::get(path)).await?.into_data()?;
        self.cache()
            .insert(key, CacheValue::Blog(Box::new(blog.clone())))
            .await;
        Ok(blog)
    }

    /// Publish a post (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for drafts missing a title or content, or
    /// another `ApiError` if the request fails.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_blog(&self, draft: &BlogDraft) -> Result<Blog, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::Invalid(e.to_string()))?;
        let request = ApiRequest::post("blogs/create-blog", serde_json::to_value(draft)?)
            .authenticated()
            .invalidating(Tag::Blogs);
        self.fetch(&request).await?.into_data()
    }

    /// Replace a post's fields (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Invalid` for incomplete drafts, or another
    /// `ApiError` if the request fails.
    #[instrument(skip(self, draft), fields(blog_id = %id))]
    pub async fn update_blog(&self, id: &BlogId, draft: &BlogDraft) -> Result<Blog, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::Invalid(e.to_string()))?;
        let path = format!("blogs/{}", segment(id.as_str()));
        let request = ApiRequest::patch(path, serde_json::to_value(draft)?)
            .authenticated()
            .invalidating(Tag::Blogs);
        self.fetch(&request).await?.into_data()
    }

    /// Remove a post (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(blog_id = %id))]
    pub async fn delete_blog(&self, id: &BlogId) -> Result<(), ApiError> {
        let path = format!("blogs/{}", segment(id.as_str()));
        let request = ApiRequest::delete(path)
            .authenticated()
            .invalidating(Tag::Blogs);
        self.fetch(&request).await?;
        Ok(())
    }
}
