//! Paths whose write-protected misses are dropped instead of failing.

use crate::canonical::CanonicalRequest;

/// Path prefixes for operational calls (long-poll subscriptions and the
/// like) that are expected to be cancelled.
///
/// A write-protected miss on one of these completes without any delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SilencedPaths {
    prefixes: Vec<String>,
}

impl SilencedPaths {
    /// Builds the allow-list from path prefixes such as `/v2/subscribe`.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = prefixes.into_iter().map(Into::into).filter(|p: &String| !p.is_empty());
        Self { prefixes: prefixes.collect() }
    }

    /// Whether `request`'s path starts with any configured prefix.
    #[must_use]
    pub fn matches(&self, request: &CanonicalRequest) -> bool {
        let path = request.path();
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_path_prefix_only() {
        let silenced = SilencedPaths::new(["/v2/subscribe"]);
        let request = |uri: &str| CanonicalRequest::new("GET", uri);
        assert!(silenced.matches(&request("http://ps.example.test/v2/subscribe/k/ch/0")));
        assert!(!silenced.matches(&request("http://ps.example.test/v2/publish")));
        assert!(!silenced.matches(&request("http://ps.example.test/x?p=/v2/subscribe")));
    }

    #[test]
    fn empty_prefixes_are_ignored() {
        let silenced = SilencedPaths::new([""]);
        assert!(silenced.is_empty());
        assert!(!silenced.matches(&CanonicalRequest::new("GET", "http://example.test/")));
    }
}
