use leptos::ev;
use leptos::leptos_dom::helpers::{
    request_animation_frame, set_timeout, set_timeout_with_handle, window_event_listener,
    TimeoutHandle,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::time::Duration;

use crate::config::{DotConfig, GridConfig, SiteConfig};
use crate::date::{format_today, DateStyle};
use crate::fetch::HttpFetcher;
use crate::layout::{compute_lines, BoundsLookup, Line, Rect};
use crate::model::{Post, PostId};
use crate::render::{grid_element_id, grid_items, task_rows, GridItem, TaskRow};
use crate::store::PostStore;
use crate::theme::{ThemeManager, THEMES};
use crate::viewer::{ContentViewer, ViewerState};

/// Looks up rendered grid tiles by their element id.
struct DomBounds;

impl BoundsLookup for DomBounds {
    fn bounds_by_id(&self, id: &PostId) -> Option<Rect> {
        let element = document().get_element_by_id(&grid_element_id(id))?;
        Some(rect_of(&element))
    }
}

fn rect_of(element: &web_sys::Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

#[component]
pub fn App(config: SiteConfig) -> impl IntoView {
    let (store, set_store) = signal(PostStore::default());
    let viewer_state = RwSignal::new(ViewerState::Closed);

    let viewer = ContentViewer::new(HttpFetcher, config.content_dir.clone(), config.markdown);
    viewer.subscribe(move |state| viewer_state.set(state.clone()));
    let viewer = StoredValue::new_local(viewer);

    let index_url = config.index_url.clone();
    Effect::new(move |_| {
        let index_url = index_url.clone();
        spawn_local(async move {
            let mut loaded = PostStore::default();
            if let Err(e) = loaded.load(&HttpFetcher, &index_url).await {
                log::error!("{e}");
            }
            set_store.set(loaded);
        });
    });

    let open_post = Callback::new(move |post: Post| {
        let viewer = viewer.get_value();
        spawn_local(async move {
            // Failures are logged by the viewer and shown in the overlay.
            let _ = viewer.open(post).await;
        });
    });
    let close_post = Callback::new(move |_: ()| viewer.with_value(|v| v.close()));

    let theme = ThemeManager::new(config.theme_storage_key.clone());

    view! {
        <main class="notebook-page" style="display: flex; justify-content: center; padding: 2rem 0; min-height: 100vh;">
            <div class="notebook" style="width: 91.666%; max-width: 56rem; background: white; border-radius: 1rem; overflow: hidden; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1);">
                <Header theme=theme />
                <div style="padding: 20px; display: flex; flex-direction: column;">
                    <DateRow />
                    <div style="display: flex; height: 500px; margin-top: 20px;">
                        <DotGrid
                            grid=config.grid
                            dots=config.dots.clone()
                            debounce_ms=config.resize_debounce_ms
                            store=store
                            on_open=open_post
                        />
                        <TaskList store=store on_open=open_post />
                    </div>
                </div>
            </div>
            <PostModal state=viewer_state on_close=close_post />
        </main>
    }
}

#[component]
fn Header(theme: ThemeManager) -> impl IntoView {
    let (current, set_current) = signal(theme.restore());
    let change_theme = move |e| {
        let name = event_target_value(&e);
        theme.change(&name);
        set_current.set(name);
    };

    view! {
        <header class="notebook-header" style="display: flex; justify-content: space-between; align-items: center; padding: 12px 20px; border-bottom: 1px solid #e5e7eb;">
            <span style="font-weight: 600;">"Notebook"</span>
            <select
                class="theme-select"
                style="background: transparent; border: 1px solid #d1d5db; border-radius: 4px; padding: 2px 6px;"
                prop:value=move || current.get()
                on:change=change_theme
            >
                {THEMES.iter().map(|t| view! { <option value=*t>{*t}</option> }).collect_view()}
            </select>
        </header>
    }
}

#[component]
fn DateRow() -> impl IntoView {
    let today = format_today(DateStyle::Long);
    view! {
        <div class="date-row" style="display: flex;">
            <div style="width: 12rem; border: 1px solid #d1d5db; padding: 4px 12px; font-size: 0.875rem; color: #6b7280;">"DATE"</div>
            <div style="flex-grow: 1; border: 1px solid #d1d5db; border-left: 0; padding: 4px 12px;">{today}</div>
            <div style="width: 3rem; border: 1px solid #d1d5db; border-left: 0;"></div>
        </div>
    }
}

#[component]
fn DotGrid(
    grid: GridConfig,
    dots: DotConfig,
    debounce_ms: u32,
    store: ReadSignal<PostStore>,
    on_open: Callback<Post>,
) -> impl IntoView {
    let grid_ref = NodeRef::<leptos::html::Div>::new();
    let (lines, set_lines) = signal(Vec::<Line>::new());

    let refresh = move || {
        let Some(container) = grid_ref.get_untracked() else {
            return;
        };
        let container = rect_of(&container);
        let next = store.with_untracked(|s| compute_lines(s.connections(), container, &DomBounds));
        set_lines.set(next);
    };

    // Tiles are in the DOM once the effect runs; wait a frame for layout.
    Effect::new(move |_| {
        store.track();
        request_animation_frame(refresh);
    });

    let pending = StoredValue::new(None::<TimeoutHandle>);
    let _ = window_event_listener(ev::resize, move |_| {
        if let Some(handle) = pending.get_value() {
            handle.clear();
        }
        match set_timeout_with_handle(refresh, Duration::from_millis(debounce_ms.into())) {
            Ok(handle) => pending.set_value(Some(handle)),
            Err(_) => refresh(),
        }
    });

    let template = format!(
        "grid-template-columns: repeat({}, 1fr); grid-template-rows: repeat({}, 1fr);",
        grid.columns, grid.rows
    );
    let dot_style = format!(
        "position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); width: {0}px; height: {0}px; border-radius: 50%; background: {1};",
        dots.dot_size, dots.dot_color
    );
    let dot_count = (grid.rows * grid.columns) as usize;

    view! {
        <div
            node_ref=grid_ref
            class="dot-grid"
            style=format!("position: relative; flex-grow: 1; display: grid; {template}")
        >
            <div
                class="dot-layer"
                style=format!("position: absolute; top: 0; left: 0; width: 100%; height: 100%; display: grid; pointer-events: none; {template}")
            >
                {(0..dot_count)
                    .map(|_| view! { <div style="position: relative;"><div class="dot" style=dot_style.clone()></div></div> })
                    .collect_view()}
            </div>
            {move || {
                store
                    .with(|s| grid_items(s, &grid))
                    .into_iter()
                    .map(|item| view! { <GridPost item=item on_open=on_open /> })
                    .collect_view()
            }}
            <svg
                class="connections-overlay"
                style="position: absolute; top: 0; left: 0; width: 100%; height: 100%; pointer-events: none; z-index: 0;"
            >
                {move || {
                    lines
                        .get()
                        .into_iter()
                        .map(|line| {
                            view! {
                                <line
                                    x1=line.x1.to_string()
                                    y1=line.y1.to_string()
                                    x2=line.x2.to_string()
                                    y2=line.y2.to_string()
                                    stroke=line.color
                                    stroke-width=line.width.to_string()
                                    stroke-dasharray=line.dash_array
                                />
                            }
                        })
                        .collect_view()
                }}
            </svg>
        </div>
    }
}

#[component]
fn GridPost(item: GridItem, on_open: Callback<Post>) -> impl IntoView {
    let style = format!(
        "display: flex; align-items: center; border-radius: 4px; cursor: pointer; text-decoration: none; {}",
        item.css()
    );
    let href = item.post.href();
    let data_id = item.post.id.to_string();
    let title = item.post.title.clone();
    let post = item.post;
    let on_click = move |e: ev::MouseEvent| {
        if post.opens_in_viewer() {
            e.prevent_default();
            on_open.run(post.clone());
        }
    };

    view! {
        <a id=item.element_id class="grid-post" data-post-id=data_id href=href style=style on:click=on_click>
            {title}
        </a>
    }
}

#[component]
fn TaskList(store: ReadSignal<PostStore>, on_open: Callback<Post>) -> impl IntoView {
    view! {
        <div class="task-list" style="display: flex; flex-direction: column; gap: 12px; margin-left: 20px; width: 16rem; flex-grow: 0;">
            // Rebuilt wholesale whenever the store changes.
            {move || {
                store
                    .with(task_rows)
                    .into_iter()
                    .map(|row| view! { <TaskItem row=row on_open=on_open /> })
                    .collect_view()
            }}
        </div>
    }
}

#[component]
fn TaskItem(row: TaskRow, on_open: Callback<Post>) -> impl IntoView {
    let marker_style = format!(
        "width: 20px; height: 20px; border: 1px solid; border-radius: 50%; flex-shrink: 0; {}",
        row.marker_css()
    );
    let label_style = format!(
        "display: flex; align-items: center; flex-grow: 1; height: 20px; padding: 0 12px; border: 1px solid #ddd; border-radius: 4px; text-decoration: none; {}",
        row.text.css()
    );
    let href = row.post.href();
    let data_id = row.post.id.to_string();
    let title = row.post.title.clone();
    let post = row.post;
    let on_click = move |e: ev::MouseEvent| {
        if post.opens_in_viewer() {
            e.prevent_default();
            on_open.run(post.clone());
        }
    };

    view! {
        <div class="task-item" data-post-id=data_id style="display: flex; align-items: center; gap: 12px;">
            <div class="circle" style=marker_style></div>
            <a class="task-line" href=href style=label_style on:click=on_click>
                {title}
            </a>
        </div>
    }
}

/// How long the overlay takes to fade in or out.
const FADE: Duration = Duration::from_millis(300);
// Lets the overlay mount at opacity 0 before the fade-in starts.
const FADE_IN_DELAY: Duration = Duration::from_millis(10);

fn backdrop_style(visible: bool) -> String {
    format!(
        "position: fixed; top: 0; left: 0; width: 100%; height: 100%; background-color: rgba(0, 0, 0, 0.7); display: flex; justify-content: center; align-items: center; z-index: 100; opacity: {}; transition: opacity {}ms ease;",
        if visible { 1 } else { 0 },
        FADE.as_millis()
    )
}

/// The viewer closes at once; the overlay keeps showing the last open post
/// while it fades out, then unmounts.
#[component]
fn PostModal(state: RwSignal<ViewerState>, on_close: Callback<()>) -> impl IntoView {
    let shown = RwSignal::new(ViewerState::Closed);
    let (mounted, set_mounted) = signal(false);
    let (visible, set_visible) = signal(false);
    let unmount = StoredValue::new(None::<TimeoutHandle>);

    Effect::new(move |_| {
        let current = state.get();
        if current.is_open() {
            if let Some(handle) = unmount.get_value() {
                handle.clear();
                unmount.set_value(None);
            }
            shown.set(current);
            if mounted.get_untracked() {
                set_visible.set(true);
            } else {
                set_mounted.set(true);
                set_timeout(
                    move || {
                        if state.with_untracked(ViewerState::is_open) {
                            set_visible.set(true);
                        }
                    },
                    FADE_IN_DELAY,
                );
            }
        } else {
            set_visible.set(false);
            match set_timeout_with_handle(move || set_mounted.set(false), FADE) {
                Ok(handle) => unmount.set_value(Some(handle)),
                Err(_) => set_mounted.set(false),
            }
        }
    });

    let backdrop_click = move |e: ev::MouseEvent| {
        if e.target() == e.current_target() {
            on_close.run(());
        }
    };

    view! {
        <Show when=move || mounted.get()>
            <div
                class="post-modal"
                style=move || backdrop_style(visible.get())
                on:click=backdrop_click
            >
                <div
                    class="post-content"
                    style="background-color: white; padding: 2rem; border-radius: 8px; max-width: 800px; width: 90%; max-height: 80vh; overflow-y: auto; position: relative;"
                >
                    <button
                        class="post-close"
                        style="position: absolute; top: 10px; right: 10px; font-size: 24px; background: none; border: none; cursor: pointer;"
                        on:click=move |_| on_close.run(())
                    >
                        "×"
                    </button>
                    <h2>{move || shown.with(|s| s.post().map(|p| p.title.clone()).unwrap_or_default())}</h2>
                    {move || match shown.get() {
                        ViewerState::Loading { .. } => {
                            view! { <div class="post-loading" style="padding: 1rem 0;">"Loading content..."</div> }.into_any()
                        }
                        ViewerState::Ready { html, .. } => {
                            view! { <div class="post-markdown" inner_html=html></div> }.into_any()
                        }
                        ViewerState::Failed { message, .. } => {
                            view! {
                                <div class="post-error" style="padding: 1rem 0; color: #b91c1c;">
                                    "Could not load this post. " {message}
                                </div>
                            }
                                .into_any()
                        }
                        ViewerState::Closed => ().into_any(),
                    }}
                </div>
            </div>
        </Show>
    }
}
