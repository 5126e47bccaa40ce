//! File list component for the archive view.
//!
//! Directories open in place; files are read from the archive and offered
//! as a download.

use icondata::Icon as IconData;
use leptos::logging::error;
use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::ReadStream;
use crate::models::Entry;
use crate::utils::dom;
use crate::utils::format::{format_date_iso, format_size};

stylance::import_crate_style!(css, "src/components/archive/file_list.module.css");

fn get_icon(entry: &Entry) -> IconData {
    if entry.is_dir() { ic::FOLDER } else { ic::FILE }
}

/// Read `name` from the open archive and hand the bytes to the browser.
fn download(ctx: AppContext, name: String) {
    let stream = match ctx.controller().read_file(&name) {
        Ok(stream) => stream,
        Err(e) => {
            error!("[files] cannot read {}: {}", name, e);
            return;
        }
    };
    stream.read_to_end(Box::new(move |result| match result {
        Ok(bytes) => {
            if let Err(e) = dom::download_bytes(&name, &bytes) {
                error!("[files] download of {} failed: {:?}", name, e);
            }
        }
        Err(e) => error!("[files] reading {} failed: {}", name, e),
    }));
}

#[component]
pub fn FileList() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let entries = Signal::derive(move || ctx.archive.with(|s| s.cwd_entries()));

    view! {
        <div class=css::list role="grid" aria-label="File list">
            // Column header (desktop only, hidden on mobile via CSS)
            <div class=css::listHeader role="row">
                <span class=css::headerIcon></span>
                <span class=css::headerName>"Name"</span>
                <span class=css::headerDate>"Modified"</span>
                <span class=css::headerSize>"Size"</span>
            </div>
            <For
                each=move || entries.get()
                key=|entry| (entry.name.clone(), entry.length, entry.mtime)
                children=move |entry| {
                    view! { <FileListItem entry=entry /> }
                }
            />
        </div>
    }
}

#[component]
fn FileListItem(entry: Entry) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let icon = get_icon(&entry);
    let is_dir = entry.is_dir();
    let label = entry.base_name().to_string();
    let size = if is_dir { "-".to_string() } else { format_size(Some(entry.length)) };
    let modified = entry.mtime.map(format_date_iso);
    let name = entry.name;

    let handle_click = move |_: leptos::ev::MouseEvent| {
        if is_dir {
            ctx.controller().change_dir(&name);
        } else {
            download(ctx, name.clone());
        }
    };

    view! {
        <div
            class=css::item
            role="row"
            on:click=handle_click
            title=if is_dir { "Open folder" } else { "Download" }
        >
            <span class=if is_dir { css::iconDir } else { css::iconFile }>
                <Icon icon=icon />
            </span>
            <span class=css::name>{label}</span>
            <span class=css::date>{modified.unwrap_or_default()}</span>
            <span class=css::size>{size}</span>
        </div>
    }
}
