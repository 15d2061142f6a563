use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use super::render;
use super::state::{InteractionController, SelectedNode};
use super::store::SnapshotStore;
use super::types::GraphSnapshot;
use crate::cache::{GraphCoordinator, LoadStatus, Mount, Query};
use crate::config::GraphViewConfig;

struct ViewState {
	store: SnapshotStore,
	controller: InteractionController,
	ctx: Option<CanvasRenderingContext2d>,
}

impl ViewState {
	fn draw(&mut self) {
		let Some(ctx) = &self.ctx else {
			return;
		};
		let positions = self.store.positions(&mut rand::thread_rng());
		let snapshot = self.store.current();
		let commands = render::draw_commands(
			&snapshot,
			&positions,
			self.controller.selection(),
			self.store.surface(),
		);
		render::paint(&commands, ctx);
	}
}

fn apply_graph(
	state: &RefCell<ViewState>,
	query: &Query<GraphSnapshot>,
	on_status: WriteSignal<LoadStatus>,
	on_select: WriteSignal<Option<SelectedNode>>,
) {
	on_status.set(query.status());
	let Some(snapshot) = &query.data else {
		return;
	};
	let mut state = state.borrow_mut();
	if state.store.holds(snapshot) {
		return;
	}
	state.store.set(Rc::clone(snapshot));
	on_select.set(state.controller.selection().details(snapshot));
	state.draw();
}

/// Canvas view of the thought graph.
///
/// Loads through `coordinator` on mount, whenever `reload` changes and when
/// the window regains focus; the cache decides whether that means a
/// network round trip.
#[component]
pub fn ThoughtGraphCanvas(
	/// Shared cache over the backend.
	coordinator: Rc<GraphCoordinator>,
	/// Receives every load status change.
	on_status: WriteSignal<LoadStatus>,
	/// Receives the selected node, or `None` when cleared.
	on_select: WriteSignal<Option<SelectedNode>>,
	/// Surface size and hit-testing settings.
	#[prop(optional)]
	config: GraphViewConfig,
	/// Bumped by the host to request a reload.
	#[prop(optional)]
	reload: Option<Signal<u64>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let surface = config.surface;
	let state = Rc::new(RefCell::new(ViewState {
		store: SnapshotStore::new(surface),
		controller: InteractionController::new(config.hit_threshold, config.hit_mode),
		ctx: None,
	}));

	let mount = Mount::new();
	let mount_cleanup = mount.clone();
	on_cleanup(move || mount_cleanup.unmount());

	let refresh: Rc<dyn Fn()> = {
		let state = Rc::clone(&state);
		Rc::new(move || {
			if !mount.is_alive() {
				return;
			}
			let (coordinator, state, mount) =
				(Rc::clone(&coordinator), Rc::clone(&state), mount.clone());
			spawn_local(async move {
				if let Some(query) = coordinator.load_graph(&mount).await {
					apply_graph(&state, &query, on_status, on_select);
				}
			});
		})
	};

	let state_init = Rc::clone(&state);
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(surface.width as u32);
		canvas.set_height(surface.height as u32);

		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
		if ctx.is_none() {
			warn!("2d canvas context unavailable, graph will not be drawn");
		}
		let mut state = state_init.borrow_mut();
		state.ctx = ctx;
		state.draw();
	});

	let refresh_effect = Rc::clone(&refresh);
	Effect::new(move |_| {
		if let Some(reload) = reload {
			reload.track();
		}
		refresh_effect();
	});

	let refresh_focus = Rc::clone(&refresh);
	let focus_listener = window_event_listener(ev::focus, move |_| refresh_focus());
	on_cleanup(move || focus_listener.remove());

	let state_click = Rc::clone(&state);
	let on_click = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut state = state_click.borrow_mut();
		let snapshot = state.store.current();
		let positions = state.store.positions(&mut rand::thread_rng());
		let selection = state.controller.handle_pointer(&snapshot, &positions, x, y);
		debug!("pointer at ({x:.0}, {y:.0}) -> {selection:?}");
		on_select.set(selection.details(&snapshot));
		state.draw();
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="thought-graph-canvas"
			on:click=on_click
			style=format!(
				"display: block; cursor: pointer; width: {}px; height: {}px;",
				surface.width,
				surface.height,
			)
		/>
	}
}
