//! Per-resource endpoints, each as an `impl ApiClient` block.
//!
//! Reads go through the query cache under their [`CacheKey`](crate::cache::CacheKey);
//! mutations invalidate the matching [`Tag`](crate::cache::Tag).

pub mod auth;
pub mod blogs;
pub mod meals;
pub mod newsletter;
pub mod orders;
pub mod reviews;
pub mod users;

/// Percent-encode an id for use as a path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("665f1a"), "665f1a");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
