//! Application router component.
//!
//! Handles path-based routing with the History API. Uses native popstate
//! events instead of leptos_router so the controller stays the single owner
//! of navigation side effects.
//!
//! # Architecture
//!
//! - **`AppContext::route` mirrors the address bar**: the controller pushes
//!   history entries through its host, the browser reports back/forward
//!   navigation through `popstate`
//! - **Route changes are replayed into the controller**: loading an archive
//!   or changing directory happens in `sync_route`
//! - **ArchiveView stays mounted** while only the directory changes

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;

use crate::app::AppContext;
use crate::components::archive::ArchiveView;
use crate::components::landing::Landing;
use crate::models::Route;

/// Main application router.
///
/// - `/` → Landing page
/// - `/<key>` → Archive root
/// - `/<key>/dir` → Directory inside the archive
#[component]
pub fn AppRouter() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let route = ctx.route;

    // Back/forward buttons (runs once on mount)
    let closure = Closure::wrap(Box::new(move || {
        route.set(Route::current());
    }) as Box<dyn Fn()>);

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
    }

    // Keep the closure alive for the lifetime of the app
    closure.forget();

    Effect::new(move |_| {
        let current = route.get();
        ctx.controller().sync_route(&current);
    });

    let has_archive = Memo::new(move |_| route.with(|r| r.key().is_some()));

    view! {
        <Show when=move || has_archive.get() fallback=|| view! { <Landing /> }>
            <ArchiveView />
        </Show>
    }
}
