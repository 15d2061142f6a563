use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{BrainStats, HttpGraphSource};
use crate::cache::{BrowserClock, GraphCoordinator, LoadStatus};
use crate::components::thought_graph::{SelectedNode, ThoughtGraphCanvas};
use crate::config::GraphViewConfig;

/// Window event that expires the cached graph and stats.
pub const THOUGHT_SUBMITTED_EVENT: &str = "thought-submitted";

/// Side panel for the selected node. Attributes are shown raw.
#[component]
fn NodeDetailsPanel(selected: ReadSignal<Option<SelectedNode>>) -> impl IntoView {
	move || {
		selected.get().map(|node| {
			let attributes = node
				.attributes
				.as_ref()
				.and_then(|attrs| serde_json::to_string_pretty(attrs).ok())
				.unwrap_or_default();
			view! {
				<aside class="node-details" data-node-id=node.id>
					<h2>{node.label}</h2>
					<p class="node-kind">{node.kind.as_str()}</p>
					<pre>{attributes}</pre>
				</aside>
			}
		})
	}
}

fn status_line(status: LoadStatus) -> impl IntoView {
	match status {
		LoadStatus::Loading => view! { <p class="graph-status">"Loading graph..."</p> }.into_any(),
		LoadStatus::Ready => ().into_any(),
		LoadStatus::Failed {
			message,
			showing_stale: true,
		} => view! { <p class="graph-status stale" title=message>"Showing cached graph"</p> }
			.into_any(),
		LoadStatus::Failed { message, .. } => {
			view! { <p class="graph-status error">{format!("Could not load graph: {message}")}</p> }
				.into_any()
		}
	}
}

/// Default Home Page
#[component]
pub fn Home(config: GraphViewConfig) -> impl IntoView {
	let coordinator = Rc::new(GraphCoordinator::new(
		Rc::new(HttpGraphSource::new(&config.api_base)),
		Rc::new(BrowserClock),
		config.stale_policy(),
	));

	let (status, set_status) = signal(LoadStatus::default());
	let (selected, set_selected) = signal(None::<SelectedNode>);
	let (stats, set_stats) = signal(None::<BrainStats>);
	let (reload, set_reload) = signal(0_u64);

	// Dispatched on `window` by the note-capture form after a successful
	// submission.
	let submitted_source = Rc::clone(&coordinator);
	let submitted_listener = window_event_listener_untyped(THOUGHT_SUBMITTED_EVENT, move |_| {
		submitted_source.thought_submitted();
		set_reload.update(|n| *n += 1);
	});
	on_cleanup(move || submitted_listener.remove());

	let stats_source = Rc::clone(&coordinator);
	Effect::new(move |_| {
		reload.track();
		let stats_source = Rc::clone(&stats_source);
		spawn_local(async move {
			if let Some(loaded) = stats_source.stats().await.data {
				set_stats.set(Some((*loaded).clone()));
			}
		});
	});

	view! {
		<div class="fullscreen-graph">
			<ThoughtGraphCanvas
				coordinator=coordinator
				config=config
				on_status=set_status
				on_select=set_selected
				reload=Signal::from(reload)
			/>
			<div class="graph-overlay">
				<h1>"Thought Graph"</h1>
				{move || {
					stats
						.get()
						.map(|s| {
							view! {
								<p class="subtitle">
									{format!("{} thoughts, {} entities", s.thoughts, s.entities)}
								</p>
							}
						})
				}}
				{move || status_line(status.get())}
			</div>
			<NodeDetailsPanel selected=selected />
		</div>
	}
}
