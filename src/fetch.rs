use futures::future::LocalBoxFuture;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to `{path}` failed: {message}")]
    Network { path: String, message: String },

    #[error("`{path}` returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("could not read body of `{path}`: {message}")]
    Body { path: String, message: String },
}

/// Retrieves text resources by path. Futures are `'static` so that a single
/// in-flight request can be shared between waiters.
pub trait Fetcher {
    fn fetch_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, FetchError>>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::rc::Rc<F> {
    fn fetch_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        (**self).fetch_text(path)
    }
}

/// `window.fetch` backed implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, path: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        let path = path.to_string();
        Box::pin(async move {
            let network = |e: wasm_bindgen::JsValue| FetchError::Network {
                path: path.clone(),
                message: describe(&e),
            };
            let window = web_sys::window().ok_or_else(|| FetchError::Network {
                path: path.clone(),
                message: "no window".to_string(),
            })?;
            let response = JsFuture::from(window.fetch_with_str(&path))
                .await
                .map_err(network)?;
            let response: web_sys::Response = response.dyn_into().map_err(network)?;
            if !response.ok() {
                return Err(FetchError::Status {
                    path,
                    status: response.status(),
                });
            }

            let body = |e: wasm_bindgen::JsValue| FetchError::Body {
                path: path.clone(),
                message: describe(&e),
            };
            let text = JsFuture::from(response.text().map_err(body)?)
                .await
                .map_err(body)?;
            text.as_string().ok_or_else(|| FetchError::Body {
                path: path.clone(),
                message: "body is not text".to_string(),
            })
        })
    }
}

fn describe(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Joins a post's relative `file` onto the content directory.
pub fn content_path(content_dir: &str, file: &str) -> String {
    let file = file.trim_start_matches("./").trim_start_matches('/');
    if content_dir.is_empty() {
        file.to_string()
    } else if content_dir.ends_with('/') {
        format!("{content_dir}{file}")
    } else {
        format!("{content_dir}/{file}")
    }
}
