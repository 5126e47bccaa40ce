//! Status bar component.
//!
//! Displays the archive key, peer count, content size and transfer totals.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::utils::{format_peers, format_size};

stylance::import_crate_style!(css, "src/components/status.module.css");

/// Status bar shown above the archive view.
///
/// ## Responsive behavior
///
/// | Breakpoint | Display |
/// |------------|---------|
/// | Desktop (> 768px) | Full key, peers, size, up/down totals |
/// | Mobile (< 768px) | Short key, peers, size |
#[component]
pub fn Status() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided at root");

    let key = Memo::new(move |_| ctx.archive.with(|s| s.key.clone()));
    let full_key = Signal::derive(move || key.get().map(|k| k.to_string()).unwrap_or_default());
    let short_key = Signal::derive(move || key.get().map(|k| k.short()).unwrap_or_default());
    let link = Signal::derive(move || key.get().map(|k| k.link()).unwrap_or_default());

    let peers = Signal::derive(move || ctx.archive.with(|s| format_peers(s.num_peers)));
    let size = Signal::derive(move || ctx.archive.with(|s| format_size(s.size)));
    let uploaded = Signal::derive(move || ctx.archive.with(|s| format_size(Some(s.uploaded))));
    let downloaded =
        Signal::derive(move || ctx.archive.with(|s| format_size(Some(s.downloaded))));
    let error = Signal::derive(move || ctx.archive.with(|s| s.error.clone()));

    let close = move |_: leptos::ev::MouseEvent| {
        ctx.controller().close();
    };

    view! {
        <header class=css::bar>
            <div class=css::section>
                <span class=css::key title=link>
                    <span class=css::labelIcon><Icon icon=ic::LINK /></span>
                    <span class=css::keyFull>{full_key}</span>
                    <span class=css::keyShort>{short_key}</span>
                </span>

                <span class=css::label>
                    <span class=css::labelIcon><Icon icon=ic::PEERS /></span>
                    <span class=css::value>{peers}</span>
                </span>

                <span class=css::label>
                    <span class=css::labelIcon><Icon icon=ic::SIZE /></span>
                    <span class=css::value>{size}</span>
                </span>

                <span class=css::transfer>
                    <span class=css::labelIcon><Icon icon=ic::UPLOAD /></span>
                    <span class=css::value>{uploaded}</span>
                    <span class=css::labelIcon><Icon icon=ic::DOWNLOAD /></span>
                    <span class=css::value>{downloaded}</span>
                </span>
            </div>

            <button class=css::closeButton on:click=close title="Close archive">
                <Icon icon=ic::CLOSE />
            </button>
        </header>
        {move || error.get().map(|e| view! { <div class=css::error role="alert">{e}</div> })}
    }
}
