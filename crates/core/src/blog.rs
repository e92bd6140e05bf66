//! Blog posts and newsletter subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::de::{lenient_datetime, null_default};
use crate::types::{BlogId, Email, SubscriberId};

/// A published article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id", alias = "id")]
    pub id: BlogId,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    /// Article body (markdown or HTML as authored).
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_default")]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Blog {
    /// Case-insensitive match over title, content and author.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || [&self.title, &self.content, &self.author]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
    }

    /// The first `max_chars` characters of the content, with an ellipsis
    /// when cut.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head.trim_end())
        } else {
            head
        }
    }
}

/// Errors building a blog draft.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BlogError {
    #[error("blog title cannot be empty")]
    EmptyTitle,
    #[error("blog content cannot be empty")]
    EmptyContent,
}

/// Create/update payload for a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl BlogDraft {
    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError`] when title or content is blank.
    pub fn validate(&self) -> Result<(), BlogError> {
        if self.title.trim().is_empty() {
            return Err(BlogError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(BlogError::EmptyContent);
        }
        Ok(())
    }
}

impl From<&Blog> for BlogDraft {
    fn from(blog: &Blog) -> Self {
        Self {
            title: blog.title.clone(),
            content: blog.content.clone(),
            category: blog.category.clone(),
            author: blog.author.clone(),
            image: blog.image.clone(),
        }
    }
}

/// A newsletter subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: SubscriberId,
    pub email: Email,
    #[serde(default = "subscribed", deserialize_with = "subscribed_or_default")]
    pub is_subscribed: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn subscribed() -> bool {
    true
}

fn subscribed_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn blog() -> Blog {
        serde_json::from_value(json!({
            "_id": "b-1",
            "title": "Meal prep for busy weeks",
            "content": "Cook once, eat all week.",
            "author": "Chef Sam",
            "category": "Tips",
            "createdAt": "2024-02-03T04:05:06Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_blog_search_and_excerpt() {
        let blog = blog();
        assert!(blog.matches_search("MEAL PREP"));
        assert!(blog.matches_search("sam"));
        assert!(!blog.matches_search("dessert"));
        assert_eq!(blog.excerpt(9), "Cook once...");
        assert_eq!(blog.excerpt(100), "Cook once, eat all week.");
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = BlogDraft::from(&blog());
        assert!(draft.validate().is_ok());
        assert!(!serde_json::to_value(&draft).unwrap().as_object().unwrap().contains_key("image"));

        draft.content = "  ".into();
        assert_eq!(draft.validate(), Err(BlogError::EmptyContent));
        draft.title = String::new();
        assert_eq!(draft.validate(), Err(BlogError::EmptyTitle));
    }

    #[test]
    fn test_subscriber_shapes() {
        let sub: Subscriber =
            serde_json::from_value(json!({"id": "s-1", "email": "Reader@Example.com"})).unwrap();
        assert_eq!(sub.email.as_str(), "reader@example.com");
        assert!(sub.is_subscribed);

        let bad = serde_json::from_value::<Subscriber>(json!({"_id": "s-2", "email": "nope"}));
        assert!(bad.is_err());
    }
}
