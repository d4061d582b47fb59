//! Client-side rendering of a notebook-style page: grid tiles positioned on
//! a dotted grid, a task list, connector lines between related tiles, and an
//! overlay that renders a post's markdown on demand.

pub mod app;
pub mod cache;
pub mod config;
pub mod date;
pub mod fetch;
pub mod layout;
pub mod markdown;
pub mod model;
pub mod render;
pub mod store;
pub mod theme;
pub mod viewer;
