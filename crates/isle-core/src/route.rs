//! Route key normalization.

use url::Url;

/// Query marker asking the server for a partial (tree-only) response.
pub const PARTIAL_QUERY: &str = "__rsc&__partial";

/// Error type for route resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid route target '{target}': {reason}")]
    Invalid { target: String, reason: String },

    #[error("Route target '{0}' points to a different origin")]
    CrossOrigin(String),
}

/// Normalized path+query identifying a fetchable content tree.
///
/// Two navigation targets that resolve to the same path and query share a
/// key, so `/about`, `about` (from `/`) and `http://host/about#team` all map
/// to `/about`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey(String);

impl RouteKey {
    /// Resolve a navigation target against an origin.
    pub fn resolve(target: &str, origin: &Url) -> Result<Self, RouteError> {
        Self::resolve_url(target, origin).map(|url| Self::from_url(&url))
    }

    /// Resolve a navigation target to a same-origin URL, fragment included.
    pub fn resolve_url(target: &str, origin: &Url) -> Result<Url, RouteError> {
        let url = origin.join(target).map_err(|e| RouteError::Invalid {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        if url.origin() != origin.origin() {
            return Err(RouteError::CrossOrigin(target.to_string()));
        }

        Ok(url)
    }

    /// Build a key from an already-parsed URL, ignoring its origin.
    pub fn from_url(url: &Url) -> Self {
        let mut key = url.path().to_string();
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            key.push('?');
            key.push_str(query);
        }
        Self(key)
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path component without the query.
    pub fn path(&self) -> &str {
        self.0.split_once('?').map_or(self.0.as_str(), |(path, _)| path)
    }

    /// Query component, if any.
    pub fn query(&self) -> Option<&str> {
        self.0.split_once('?').map(|(_, query)| query)
    }

    /// URL of the partial tree fetch for this route.
    pub fn partial_url(&self) -> String {
        match self.query() {
            Some(query) => format!("{}?{}&{}", self.path(), query, PARTIAL_QUERY),
            None => format!("{}?{}", self.0, PARTIAL_QUERY),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RouteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let key = RouteKey::resolve("/about", &origin()).unwrap();
        assert_eq!(key.as_str(), "/about");
    }

    #[test]
    fn test_resolve_keeps_query_drops_fragment() {
        let key = RouteKey::resolve("/products?page=2#grid", &origin()).unwrap();
        assert_eq!(key.as_str(), "/products?page=2");
        assert_eq!(key.path(), "/products");
        assert_eq!(key.query(), Some("page=2"));
    }

    #[test]
    fn test_resolve_url_keeps_fragment() {
        let url = RouteKey::resolve_url("/products?page=2#grid", &origin()).unwrap();
        assert_eq!(url.fragment(), Some("grid"));
        assert_eq!(RouteKey::from_url(&url).as_str(), "/products?page=2");
    }

    #[test]
    fn test_resolve_same_origin_url() {
        let key = RouteKey::resolve("https://shop.example.com/about", &origin()).unwrap();
        assert_eq!(key.as_str(), "/about");
    }

    #[test]
    fn test_resolve_rejects_other_origin() {
        let err = RouteKey::resolve("https://evil.example.net/about", &origin()).unwrap_err();
        assert!(matches!(err, RouteError::CrossOrigin(_)));
    }

    #[test]
    fn test_resolve_empty_query_is_dropped() {
        let key = RouteKey::resolve("/about?", &origin()).unwrap();
        assert_eq!(key.as_str(), "/about");
    }

    #[test]
    fn test_partial_url_without_query() {
        let key = RouteKey::resolve("/about", &origin()).unwrap();
        assert_eq!(key.partial_url(), "/about?__rsc&__partial");
    }

    #[test]
    fn test_partial_url_with_query() {
        let key = RouteKey::resolve("/search?q=shoes", &origin()).unwrap();
        assert_eq!(key.partial_url(), "/search?q=shoes&__rsc&__partial");
    }
}
