use crate::fetch::{FetchError, Fetcher};
use crate::model::{Connection, Post, PostId, PostIndex, PostType};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetching post index: {0}")]
    Fetch(#[from] FetchError),

    #[error("parsing post index: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("post id `{0}` appears more than once")]
    DuplicateId(PostId),
}

/// Holds the loaded post index. Read-only once loaded; a failed load leaves
/// it empty. Grid posts without geometry are kept here and skipped by the
/// grid renderer, so they never take the task list down with them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostStore {
    posts: Vec<Post>,
    connections: Vec<Connection>,
}

impl PostStore {
    pub fn from_index(index: PostIndex) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        for post in &index.posts {
            if !seen.insert(&post.id) {
                return Err(LoadError::DuplicateId(post.id.clone()));
            }
        }
        Ok(Self {
            posts: index.posts,
            connections: index.connections,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Self::from_index(serde_json::from_str(text)?)
    }

    /// Fetches and parses the index at `location`. On failure the store is
    /// emptied and the error is returned to the caller.
    pub async fn load<F: Fetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        location: &str,
    ) -> Result<(), LoadError> {
        let loaded = match fetcher.fetch_text(location).await {
            Ok(text) => Self::from_json(&text),
            Err(e) => Err(e.into()),
        };
        match loaded {
            Ok(store) => {
                log::info!(
                    "loaded {} posts and {} connections from {}",
                    store.posts.len(),
                    store.connections.len(),
                    location
                );
                *self = store;
                Ok(())
            }
            Err(e) => {
                *self = Self::default();
                Err(e)
            }
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Posts of one type, in index order.
    pub fn by_type(&self, kind: PostType) -> impl Iterator<Item = &Post> + '_ {
        self.posts.iter().filter(move |post| post.kind == kind)
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.connections.is_empty()
    }
}
