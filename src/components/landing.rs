//! Landing page: create a new archive or open one by key.

use leptos::logging::error;
use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::drop_zone::AddFilesButton;
use crate::components::icons as ic;
use crate::config::{APP_NAME, APP_TAGLINE};
use crate::core::DatLibrary;
use crate::models::ArchiveKey;
use crate::utils::dom;

stylance::import_crate_style!(css, "src/components/landing.module.css");

#[component]
pub fn Landing() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let key_input = RwSignal::new(String::new());
    let key_error = RwSignal::new(None::<String>);
    let available = DatLibrary::is_available();

    let create = move |_: leptos::ev::MouseEvent| {
        if let Err(e) = ctx.controller().new_archive(None) {
            error!("[landing] failed to create archive: {}", e);
            dom::alert(&e.to_string());
        }
    };

    let open = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        match ArchiveKey::parse(&key_input.get_untracked()) {
            Ok(key) => {
                key_error.set(None);
                ctx.controller().import(key);
            }
            Err(e) => key_error.set(Some(e.to_string())),
        }
    };

    view! {
        <main class=css::landing>
            <h1 class=css::title>{APP_NAME}</h1>
            <p class=css::tagline>{APP_TAGLINE}</p>

            <Show when=move || !available>
                <p class=css::warning>
                    "The archive library failed to load. Sharing is unavailable."
                </p>
            </Show>

            <div class=css::actions>
                <button class=css::primary on:click=create disabled=!available>
                    <Icon icon=ic::PLUS />
                    <span>"New archive"</span>
                </button>
                <AddFilesButton />
            </div>
            <p class=css::hint>"or drop files anywhere on this page"</p>

            <form class=css::openForm on:submit=open>
                <input
                    class=css::keyInput
                    type="text"
                    placeholder="dat://… or archive key"
                    spellcheck="false"
                    prop:value=move || key_input.get()
                    on:input=move |ev| key_input.set(event_target_value(&ev))
                />
                <button class=css::secondary type="submit">"Open"</button>
            </form>
            {move || key_error.get().map(|e| view! { <p class=css::error>{e}</p> })}
        </main>
    }
}
