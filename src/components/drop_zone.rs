//! File intake: page-wide drag-and-drop and the "Add files" picker.
//!
//! Both hand the files to the controller, which writes them into the open
//! archive (creating one when none is open) under the current directory.

use leptos::prelude::*;
use leptos_icons::Icon;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{DragEvent, HtmlInputElement};

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::ImportRequest;
use crate::utils::dom;

stylance::import_crate_style!(css, "src/components/drop_zone.module.css");

fn import(ctx: AppContext, files: Vec<web_sys::File>) {
    if files.is_empty() {
        return;
    }
    let cwd = ctx.archive.with_untracked(|s| s.cwd.clone());
    ctx.controller().import_files(ImportRequest::new(files, &cwd));
}

/// Page-wide drop target with a highlight overlay while dragging.
#[component]
pub fn DropZone() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let dragging = RwSignal::new(false);

    // Listeners live on the document for the lifetime of the app
    let over = Closure::wrap(Box::new(move |ev: DragEvent| {
        ev.prevent_default();
        dragging.set(true);
    }) as Box<dyn Fn(DragEvent)>);

    let leave = Closure::wrap(Box::new(move |ev: DragEvent| {
        // Leaving a child element still reports coordinates inside the page
        if ev.client_x() <= 0 || ev.client_y() <= 0 {
            dragging.set(false);
        }
    }) as Box<dyn Fn(DragEvent)>);

    let drop = Closure::wrap(Box::new(move |ev: DragEvent| {
        ev.prevent_default();
        dragging.set(false);
        let files = dom::files_from_list(ev.data_transfer().and_then(|dt| dt.files()));
        import(ctx, files);
    }) as Box<dyn Fn(DragEvent)>);

    if let Some(document) = dom::document() {
        for (event, handler) in [("dragover", &over), ("dragleave", &leave), ("drop", &drop)] {
            let _ = document.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref());
        }
    }
    over.forget();
    leave.forget();
    drop.forget();

    view! {
        <Show when=move || dragging.get()>
            <div class=css::overlay>
                <div class=css::message>
                    <Icon icon=ic::ADD_FILES />
                    <span>"Drop files to share them"</span>
                </div>
            </div>
        </Show>
    }
}

/// Button opening the browser file picker.
#[component]
pub fn AddFilesButton() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let input_ref = NodeRef::<leptos::html::Input>::new();

    let on_change = move |ev: leptos::ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let files = dom::files_from_list(input.files());
        // Allow picking the same files again
        input.set_value("");
        import(ctx, files);
    };

    let open_picker = move |_: leptos::ev::MouseEvent| {
        if let Some(input) = input_ref.get() {
            input.click();
        }
    };

    view! {
        <button class=css::addButton on:click=open_picker>
            <Icon icon=ic::ADD_FILES />
            <span>"Add files"</span>
        </button>
        <input
            node_ref=input_ref
            class=css::hiddenInput
            type="file"
            multiple=true
            on:change=on_change
        />
    }
}
