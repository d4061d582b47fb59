use leptos::mount::mount_to_body;
use leptos::prelude::*;
use notebook_ui::app::App;
use notebook_ui::config::SiteConfig;

fn main() {
    console_error_panic_hook::set_once();
    // The configured level is applied below through `log::set_max_level`.
    _ = console_log::init_with_level(log::Level::Trace);

    let config = SiteConfig::from_window();
    log::set_max_level(config.log_level());
    log::info!("notebook starting, index at {}", config.index_url);

    mount_to_body(move || view! { <App config=config /> })
}
