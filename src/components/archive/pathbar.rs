//! Path bar component.
//!
//! Breadcrumb of the current archive directory with clickable segments.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;

stylance::import_crate_style!(css, "src/components/archive/pathbar.module.css");

/// Segment data for path bar rendering.
#[derive(Clone, Debug, PartialEq)]
struct PathSegment {
    label: String,
    /// Directory this segment navigates to.
    dir: String,
}

/// Split a normalized directory into its ancestors, root first.
fn segments(cwd: &str) -> Vec<PathSegment> {
    let mut out = Vec::new();
    let mut dir = String::new();
    for part in cwd.split('/').filter(|p| !p.is_empty()) {
        dir.push('/');
        dir.push_str(part);
        out.push(PathSegment {
            label: part.to_string(),
            dir: dir.clone(),
        });
    }
    out
}

#[component]
pub fn PathBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let cwd = Memo::new(move |_| ctx.archive.with(|s| s.cwd.clone()));

    let go = move |dir: String| {
        ctx.controller().change_dir(&dir);
    };

    view! {
        <nav class=css::pathbar aria-label="Archive path">
            <button class=css::segment on:click=move |_| go("/".to_string())>
                <Icon icon=ic::HOME />
            </button>
            {move || {
                let all = segments(&cwd.get());
                let last = all.len().saturating_sub(1);
                all.into_iter()
                    .enumerate()
                    .map(|(idx, segment)| {
                        let dir = segment.dir.clone();
                        view! {
                            <span class=css::separator><Icon icon=ic::CHEVRON_RIGHT /></span>
                            {if idx == last {
                                view! { <span class=css::current>{segment.label}</span> }.into_any()
                            } else {
                                view! {
                                    <button class=css::segment on:click=move |_| go(dir.clone())>
                                        <Icon icon=ic::FOLDER />
                                        <span>{segment.label}</span>
                                    </button>
                                }
                                .into_any()
                            }}
                        }
                    })
                    .collect_view()
            }}
        </nav>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert!(segments("/").is_empty());
        assert_eq!(
            segments("/photos/2016"),
            vec![
                PathSegment {
                    label: "photos".to_string(),
                    dir: "/photos".to_string(),
                },
                PathSegment {
                    label: "2016".to_string(),
                    dir: "/photos/2016".to_string(),
                },
            ]
        );
    }
}
