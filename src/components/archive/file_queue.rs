//! Import queue panel.
//!
//! Lists the file being written followed by the files waiting their turn.
//! Whenever the writing file changes, the controller moves the progress
//! listener over to it.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::models::FileDescriptor;
use crate::utils::format::format_size;

stylance::import_crate_style!(css, "src/components/archive/file_queue.module.css");

#[component]
pub fn FileQueue() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let writing_path = Memo::new(move |_| {
        ctx.archive.with(|s| {
            s.import_queue
                .writing
                .as_ref()
                .map(|f| f.full_path.clone())
        })
    });

    Effect::new(move |_| {
        if let Some(path) = writing_path.get() {
            ctx.controller().track_progress(&path);
        }
    });

    let is_idle = Signal::derive(move || ctx.archive.with(|s| s.import_queue.is_idle()));
    let writing = Signal::derive(move || ctx.archive.with(|s| s.import_queue.writing.clone()));
    let pending = Signal::derive(move || {
        ctx.archive
            .with(|s| s.import_queue.next.iter().cloned().collect::<Vec<_>>())
    });

    view! {
        <Show when=move || !is_idle.get()>
            <aside class=css::queue aria-label="Import queue">
                <h2 class=css::title>
                    <Icon icon=ic::ADD_FILES />
                    <span>"Adding files"</span>
                </h2>
                <ul class=css::items>
                    {move || writing.get().map(|file| view! { <QueueItem file=file writing=true /> })}
                    <For
                        each=move || pending.get()
                        key=|file| file.full_path.clone()
                        children=move |file| view! { <QueueItem file=file writing=false /> }
                    />
                </ul>
            </aside>
        </Show>
    }
}

#[component]
fn QueueItem(file: FileDescriptor, writing: bool) -> impl IntoView {
    let pct = file.progress_pct;
    let size = format_size(file.size);

    view! {
        <li class=if writing { css::itemWriting } else { css::item } title=file.full_path>
            <span class=css::name>{file.name}</span>
            <span class=css::size>{size}</span>
            {(pct > 0).then(|| view! {
                <span class=css::progress>
                    <span class=css::progressBar style=format!("width: {}%", pct)></span>
                </span>
                <span class=css::pct>{format!("{}%", pct)}</span>
            })}
        </li>
    }
}
