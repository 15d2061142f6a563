//! Leptos client-side thought graph: layout, rendering, selection and the
//! cached data layer that feeds them.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info, warn};

// Modules
pub mod api;
pub mod cache;
/// Leptos components.
pub mod components;
pub mod config;
pub mod error;
mod pages;

// Top-Level pages
use crate::config::GraphViewConfig;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Reads `<meta name="thought-graph-config" content="{...}">` if the host
/// page provides one.
pub fn load_config() -> GraphViewConfig {
	let raw = web_sys::window()
		.and_then(|window| window.document())
		.and_then(|document| {
			document
				.query_selector(r#"meta[name="thought-graph-config"]"#)
				.ok()
				.flatten()
		})
		.and_then(|meta| meta.get_attribute("content"));

	match raw.as_deref().map(GraphViewConfig::from_json) {
		Some(Ok(config)) => config,
		Some(Err(err)) => {
			warn!("ignoring malformed thought-graph-config: {err}");
			GraphViewConfig::default()
		}
		None => GraphViewConfig::default(),
	}
}

/// An app router which renders the homepage and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	let config = load_config();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Thought Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=move || view! { <Home config=config.clone() /> } />
			</Routes>
		</Router>
	}
}
