//! Layout of the archive page.

use leptos::prelude::*;

use super::{FileList, FileQueue, PathBar};
use crate::app::AppContext;
use crate::components::drop_zone::AddFilesButton;
use crate::components::status::Status;

stylance::import_crate_style!(css, "src/components/archive/view.module.css");

#[component]
pub fn ArchiveView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let is_empty = Signal::derive(move || ctx.archive.with(|s| s.entries.is_empty()));

    view! {
        <div class=css::page>
            <Status />
            <div class=css::toolbar>
                <PathBar />
                <AddFilesButton />
            </div>
            <main class=css::content>
                <Show
                    when=move || !is_empty.get()
                    fallback=|| view! {
                        <p class=css::empty>
                            "This archive is empty. Drop files here or wait for peers to share its contents."
                        </p>
                    }
                >
                    <FileList />
                </Show>
            </main>
            <FileQueue />
        </div>
    }
}
