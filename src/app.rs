//! Root application module.
//!
//! Contains the main App component, the AppContext definition and the
//! browser [`Host`] the archive controller navigates through.

use std::rc::Rc;

use leptos::prelude::*;

use crate::components::{AppRouter, DropZone};
use crate::core::{ArchiveController, DatLibrary, Dispatch, Host};
use crate::models::{ArchiveState, Route};
use crate::utils::dom;

pub type AppController = ArchiveController<DatLibrary, BrowserHost>;

// ============================================================================
// BrowserHost
// ============================================================================

/// Navigation and dialogs backed by the History API and `window.alert`.
pub struct BrowserHost {
    route: RwSignal<Route>,
}

impl Host for BrowserHost {
    fn navigate(&self, route: &Route) {
        if self.route.get_untracked() != *route {
            route.push();
            self.route.set(route.clone());
        }
    }

    fn alert(&self, message: &str) {
        dom::alert(message);
    }
}

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide reactive context.
///
/// Provided at the root of the component tree and accessed from any child
/// with `use_context::<AppContext>()`. `Copy` because every field is an
/// arena handle.
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Everything the UI shows about the open archive.
    pub archive: RwSignal<ArchiveState>,

    /// Current location, kept in sync with the address bar.
    pub route: RwSignal<Route>,

    controller: StoredValue<Rc<AppController>, LocalStorage>,
}

impl AppContext {
    /// Creates the context and the controller feeding it.
    ///
    /// Library callbacks are folded into `archive` through
    /// [`ArchiveState::apply`].
    pub fn new() -> Self {
        let archive = RwSignal::new(ArchiveState::new());
        let route = RwSignal::new(Route::current());

        let dispatch: Dispatch = Rc::new(move |msg| archive.update(|state| state.apply(msg)));
        let controller = ArchiveController::new(DatLibrary::new(), BrowserHost { route }, dispatch);

        Self {
            archive,
            route,
            controller: StoredValue::new_local(controller),
        }
    }

    pub fn controller(&self) -> Rc<AppController> {
        self.controller.get_value()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root component: provides [`AppContext`] and renders the router under the
/// page-wide drop target. Archive failures surface in the status banner.
#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext::new());

    view! {
        <DropZone />
        <AppRouter />
    }
}
