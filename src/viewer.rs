//! Opening posts in the overlay. Bodies are fetched once per file, rendered,
//! and kept in a [`ContentCache`] for the rest of the session. Concurrent
//! requests for the same file share one fetch, and only the most recent
//! `open` may change what is displayed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use thiserror::Error;

use crate::cache::ContentCache;
use crate::fetch::{content_path, FetchError, Fetcher};
use crate::markdown::{self, MarkdownFlavor};
use crate::model::Post;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("loading post content `{file}`: {source}")]
pub struct ContentError {
    pub file: String,
    #[source]
    pub source: FetchError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ViewerState {
    #[default]
    Closed,
    Loading {
        post: Post,
    },
    Ready {
        post: Post,
        html: String,
    },
    Failed {
        post: Post,
        message: String,
    },
}

impl ViewerState {
    pub fn post(&self) -> Option<&Post> {
        match self {
            ViewerState::Closed => None,
            ViewerState::Loading { post }
            | ViewerState::Ready { post, .. }
            | ViewerState::Failed { post, .. } => Some(post),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ViewerState::Closed)
    }
}

type PendingBody = Shared<LocalBoxFuture<'static, Result<String, ContentError>>>;
type Listener = Rc<dyn Fn(&ViewerState)>;

struct Inner<F> {
    fetcher: F,
    content_dir: String,
    flavor: MarkdownFlavor,
    cache: RefCell<ContentCache>,
    in_flight: RefCell<HashMap<String, PendingBody>>,
    generation: Cell<u64>,
    state: RefCell<ViewerState>,
    listeners: RefCell<Vec<Listener>>,
}

pub struct ContentViewer<F> {
    inner: Rc<Inner<F>>,
}

impl<F> Clone for ContentViewer<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<F: Fetcher + 'static> ContentViewer<F> {
    pub fn new(fetcher: F, content_dir: impl Into<String>, flavor: MarkdownFlavor) -> Self {
        Self {
            inner: Rc::new(Inner {
                fetcher,
                content_dir: content_dir.into(),
                flavor,
                cache: RefCell::new(ContentCache::new()),
                in_flight: RefCell::new(HashMap::new()),
                generation: Cell::new(0),
                state: RefCell::new(ViewerState::Closed),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Registers `listener` to be called after every state change.
    pub fn subscribe(&self, listener: impl Fn(&ViewerState) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn state(&self) -> ViewerState {
        self.inner.state.borrow().clone()
    }

    pub fn cached(&self, file: &str) -> Option<String> {
        self.inner.cache.borrow().get(file).map(str::to_string)
    }

    /// Shows `post`. Cached bodies are shown without suspending; otherwise the
    /// viewer is `Loading` until the fetch settles. Errors are returned so the
    /// caller can log them, and are never cached.
    pub async fn open(&self, post: Post) -> Result<(), ContentError> {
        let ticket = self.advance();

        let Some(file) = post.file.clone() else {
            self.publish(ticket, ViewerState::Ready {
                post,
                html: String::new(),
            });
            return Ok(());
        };

        if let Some(html) = self.cached(&file) {
            log::debug!("content cache hit for {file}");
            self.publish(ticket, ViewerState::Ready { post, html });
            return Ok(());
        }

        log::debug!("content cache miss for {file}");
        self.publish(ticket, ViewerState::Loading { post: post.clone() });

        match self.pending_body(&file).await {
            Ok(html) => {
                self.publish(ticket, ViewerState::Ready { post, html });
                Ok(())
            }
            Err(e) => {
                log::error!("{e}");
                self.publish(ticket, ViewerState::Failed {
                    post,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Hides the overlay. Cached content is kept, and responses still in
    /// flight will not reopen it.
    pub fn close(&self) {
        let ticket = self.advance();
        self.publish(ticket, ViewerState::Closed);
    }

    fn advance(&self) -> u64 {
        let next = self.inner.generation.get() + 1;
        self.inner.generation.set(next);
        next
    }

    fn publish(&self, ticket: u64, state: ViewerState) {
        if self.inner.generation.get() != ticket {
            log::debug!("dropping stale viewer update");
            return;
        }
        *self.inner.state.borrow_mut() = state.clone();
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(&state);
        }
    }

    // Returns the in-flight request for `file`, starting one if needed. The
    // request settles the cache and clears its own in-flight slot, so a later
    // `open` never observes a finished entry.
    fn pending_body(&self, file: &str) -> PendingBody {
        let existing = self.inner.in_flight.borrow().get(file).cloned();
        if let Some(pending) = existing {
            return pending;
        }

        let path = content_path(&self.inner.content_dir, file);
        let request = self.inner.fetcher.fetch_text(&path);
        let weak: Weak<Inner<F>> = Rc::downgrade(&self.inner);
        let key = file.to_string();
        let flavor = self.inner.flavor;
        let content_dir = self.inner.content_dir.clone();

        let pending = async move {
            let result = match request.await {
                Ok(text) => Ok(markdown::render(&text, flavor, &content_dir)),
                Err(source) => Err(ContentError {
                    file: key.clone(),
                    source,
                }),
            };
            if let Some(inner) = weak.upgrade() {
                inner.in_flight.borrow_mut().remove(&key);
                if let Ok(html) = &result {
                    inner.cache.borrow_mut().set(key.clone(), html.clone());
                }
            }
            result
        }
        .boxed_local()
        .shared();

        self.inner
            .in_flight
            .borrow_mut()
            .insert(file.to_string(), pending.clone());
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedFetcher;
    use crate::model::{PostId, PostStyles, PostType};
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    fn post(id: &str, file: Option<&str>) -> Post {
        Post {
            id: PostId::new(id),
            kind: PostType::Grid,
            title: id.to_uppercase(),
            url: None,
            file: file.map(str::to_string),
            position: None,
            size: None,
            styles: PostStyles::default(),
            show_content: true,
        }
    }

    fn viewer(fetcher: &Rc<ScriptedFetcher>) -> ContentViewer<Rc<ScriptedFetcher>> {
        ContentViewer::new(Rc::clone(fetcher), "/posts/", MarkdownFlavor::Minimal)
    }

    fn spawn_open(
        pool: &LocalPool,
        viewer: &ContentViewer<Rc<ScriptedFetcher>>,
        post: Post,
    ) {
        let viewer = viewer.clone();
        pool.spawner()
            .spawn_local(async move {
                let _ = viewer.open(post).await;
            })
            .unwrap();
    }

    #[test]
    fn second_open_uses_cache() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        fetcher.respond("/posts/a.md", "# A");
        let viewer = viewer(&fetcher);
        let a = post("a", Some("a.md"));

        block_on(viewer.open(a.clone())).unwrap();
        viewer.close();
        block_on(viewer.open(a.clone())).unwrap();

        assert_eq!(fetcher.calls_to("/posts/a.md"), 1);
        assert_eq!(
            viewer.state(),
            ViewerState::Ready {
                post: a,
                html: "<h1>A</h1>".to_string()
            }
        );
    }

    #[test]
    fn concurrent_opens_share_one_fetch() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        let viewer = viewer(&fetcher);
        let a = post("a", Some("a.md"));
        let mut pool = LocalPool::new();

        spawn_open(&pool, &viewer, a.clone());
        spawn_open(&pool, &viewer, a.clone());
        pool.run_until_stalled();
        assert_eq!(viewer.state(), ViewerState::Loading { post: a.clone() });

        fetcher.release("/posts/a.md", "body");
        pool.run_until_stalled();

        assert_eq!(fetcher.calls_to("/posts/a.md"), 1);
        assert_eq!(viewer.cached("a.md").as_deref(), Some("<p>body</p>"));
        assert!(matches!(viewer.state(), ViewerState::Ready { .. }));
    }

    #[test]
    fn late_response_does_not_replace_newer_post() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        let viewer = viewer(&fetcher);
        let a = post("a", Some("a.md"));
        let b = post("b", Some("b.md"));
        let mut pool = LocalPool::new();

        spawn_open(&pool, &viewer, a);
        spawn_open(&pool, &viewer, b.clone());
        pool.run_until_stalled();

        fetcher.release("/posts/b.md", "bee");
        pool.run_until_stalled();
        fetcher.release("/posts/a.md", "ay");
        pool.run_until_stalled();

        assert_eq!(
            viewer.state(),
            ViewerState::Ready {
                post: b,
                html: "<p>bee</p>".to_string()
            }
        );
        // The abandoned body is still worth keeping.
        assert_eq!(viewer.cached("a.md").as_deref(), Some("<p>ay</p>"));
    }

    #[test]
    fn close_survives_late_response() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        let viewer = viewer(&fetcher);
        let mut pool = LocalPool::new();

        spawn_open(&pool, &viewer, post("a", Some("a.md")));
        pool.run_until_stalled();
        viewer.close();
        fetcher.release("/posts/a.md", "late");
        pool.run_until_stalled();

        assert_eq!(viewer.state(), ViewerState::Closed);
        assert!(viewer.cached("a.md").is_some());
    }

    #[test]
    fn failures_surface_and_allow_retry() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        fetcher.fail("/posts/a.md", 500);
        let viewer = viewer(&fetcher);
        let a = post("a", Some("a.md"));

        let err = block_on(viewer.open(a.clone())).unwrap_err();
        assert_eq!(err.file, "a.md");
        assert!(matches!(viewer.state(), ViewerState::Failed { .. }));
        assert!(viewer.cached("a.md").is_none());

        fetcher.respond("/posts/a.md", "fixed");
        block_on(viewer.open(a)).unwrap();
        assert_eq!(fetcher.calls_to("/posts/a.md"), 2);
        assert_eq!(viewer.cached("a.md").as_deref(), Some("<p>fixed</p>"));
    }

    #[test]
    fn post_without_file_opens_title_only() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        let viewer = viewer(&fetcher);
        block_on(viewer.open(post("x", None))).unwrap();
        assert!(fetcher.calls().is_empty());
        assert!(matches!(viewer.state(), ViewerState::Ready { html, .. } if html.is_empty()));
    }

    #[test]
    fn listeners_see_each_transition() {
        let fetcher = Rc::new(ScriptedFetcher::default());
        fetcher.respond("/posts/a.md", "text");
        let viewer = viewer(&fetcher);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        viewer.subscribe(move |state| {
            let label = match state {
                ViewerState::Closed => "closed",
                ViewerState::Loading { .. } => "loading",
                ViewerState::Ready { .. } => "ready",
                ViewerState::Failed { .. } => "failed",
            };
            sink.borrow_mut().push(label);
        });

        block_on(viewer.open(post("a", Some("a.md")))).unwrap();
        viewer.close();
        assert_eq!(*seen.borrow(), ["loading", "ready", "closed"]);
    }
}
