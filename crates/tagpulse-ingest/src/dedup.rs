use std::collections::HashSet;

use tagpulse_core::Post;

/// Set of post `uri`s already recorded in the post log.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    uris: HashSet<String>,
}

impl DedupSet {
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        Self {
            uris: posts.iter().map(|p| p.uri.clone()).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.uris.contains(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Keep only posts whose `uri` has not been seen, recording each admitted
    /// `uri` so a repeat later in the batch (or in a later call) is rejected.
    pub fn admit(&mut self, candidates: Vec<Post>) -> Vec<Post> {
        candidates
            .into_iter()
            .filter(|post| self.uris.insert(post.uri.clone()))
            .collect()
    }
}
