use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::picking;
use super::queue::TickQueue;
use super::render;
use super::state::GraphState;
use super::tooltip::{GraphTooltip, RelationshipCache, RelationshipInfo, RelationshipQuery};
use super::types::{GraphData, GraphLink, GraphNode, PickTarget};

fn context_2d(canvas: &HtmlCanvasElement) -> CanvasRenderingContext2d {
	canvas
		.get_context("2d")
		.unwrap()
		.unwrap()
		.dyn_into()
		.unwrap()
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn random_seed() -> u64 {
	(js_sys::Math::random() * u64::MAX as f64) as u64
}

fn measure(window: &Window, canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	if fullscreen {
		(
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		)
	} else {
		// the wrapper is sized by the surrounding layout; fall back the way
		// the resize path always has
		(
			canvas
				.parent_element()
				.map(|parent| parent.client_width() as f64)
				.unwrap_or(0.0),
			canvas
				.parent_element()
				.map(|parent| parent.client_height() as f64)
				.filter(|height| *height > 0.0)
				.unwrap_or(500.0),
		)
	}
}

/// Interactive relationship graph on a pair of stacked canvases: a visible
/// scene and a hidden identity-color twin used for exact pointer picking.
/// The layout runs to convergence on mount and after every `data` change;
/// wheel zoom and background drags take the viewport over from auto-fit.
#[component]
pub fn RelationGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = false)] tooltip: bool,
	#[prop(into, optional)] on_node_click: Option<Callback<GraphNode>>,
	#[prop(into, optional)] on_link_click: Option<Callback<GraphLink>>,
	#[prop(into, optional)] on_relationship_request: Option<
		Callback<RelationshipQuery, Option<RelationshipInfo>>,
	>,
) -> impl IntoView {
	let wrapper_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let shadow_ref = NodeRef::<leptos::html::Canvas>::new();

	let state: Rc<RefCell<Option<GraphState>>> = Rc::new(RefCell::new(None));
	let queue: Rc<TickQueue> = Rc::new(TickQueue::new());
	let tip: Rc<RefCell<Option<GraphTooltip>>> = Rc::new(RefCell::new(None));
	let relationships: Rc<RefCell<RelationshipCache>> =
		Rc::new(RefCell::new(RelationshipCache::default()));
	let alive: Rc<Cell<bool>> = Rc::new(Cell::new(true));
	let suppress_click: Rc<Cell<bool>> = Rc::new(Cell::new(false));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let (state_init, queue_init, tip_init, alive_init, animate_init, resize_cb_init) = (
		state.clone(),
		queue.clone(),
		tip.clone(),
		alive.clone(),
		animate.clone(),
		resize_cb.clone(),
	);

	Effect::new(move |_| {
		let data = data.get();
		let (Some(canvas), Some(shadow)) = (canvas_ref.get(), shadow_ref.get()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let shadow: HtmlCanvasElement = shadow.into();
		let window: Window = web_sys::window().unwrap();

		// a later run of this effect is a dataset update: the simulation
		// and color pool are superseded, everything else stays wired up
		if let Some(ref mut graph) = *state_init.borrow_mut() {
			if let Err(err) = graph.update(data, random_seed()) {
				error!("dataset update failed: {err}");
			}
			return;
		}

		let measured = measure(&window, &canvas, fullscreen);
		let (w, h) = if fullscreen {
			measured
		} else {
			(width.unwrap_or(measured.0), height.unwrap_or(measured.1))
		};
		for target in [&canvas, &shadow] {
			target.set_width(w as u32);
			target.set_height(h as u32);
		}

		let graph = match GraphState::new(data, w, h, random_seed()) {
			Ok(graph) => graph,
			Err(err) => {
				error!("color pool allocation failed: {err}");
				return;
			}
		};
		*state_init.borrow_mut() = Some(graph);

		if tooltip
			&& let Some(wrapper) = wrapper_ref.get()
		{
			*tip_init.borrow_mut() = GraphTooltip::new(&window, &wrapper.into());
		}

		// window resizes keep the visual center stable and repaint at the
		// new canvas size; the zoom factor is untouched
		let (state_resize, canvas_resize, shadow_resize) =
			(state_init.clone(), canvas.clone(), shadow.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let win: Window = web_sys::window().unwrap();
			let (nw, nh) = measure(&win, &canvas_resize, fullscreen);
			for target in [&canvas_resize, &shadow_resize] {
				target.set_width(nw as u32);
				target.set_height(nh as u32);
			}
			if let Some(ref mut graph) = *state_resize.borrow_mut() {
				graph.viewport.handle_resize(nw, nh);
				graph.request_repaint();
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		// frame loop: one simulation step per frame while energy remains,
		// repaint requests funneled through the single-slot queue so a
		// frame never paints twice
		let ctx = context_2d(&canvas);
		let shadow_ctx = context_2d(&shadow);
		let (state_anim, queue_anim, alive_anim, animate_inner) = (
			state_init.clone(),
			queue_init.clone(),
			alive_init.clone(),
			animate_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.get() {
				return;
			}
			{
				let mut graph = state_anim.borrow_mut();
				if let Some(graph) = graph.as_mut() {
					let ticked = graph.tick();
					if ticked || graph.take_repaint_request() {
						let state_paint = state_anim.clone();
						let (ctx, shadow_ctx) = (ctx.clone(), shadow_ctx.clone());
						queue_anim.add(move || {
							if let Some(graph) = state_paint.borrow_mut().as_mut() {
								graph.fit_view();
								render::render(
									&graph.data,
									&graph.simulation,
									&graph.viewport,
									&graph.pool,
									graph.layout_end,
									&ctx,
									&shadow_ctx,
								);
							}
						});
					}
				}
			}
			queue_anim.flush();
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(shadow) = shadow_ref.get() else {
			return;
		};
		let shadow: HtmlCanvasElement = shadow.into();
		let (x, y) = pointer_position(&shadow, &ev);
		if let Some(ref mut graph) = *state_md.borrow_mut() {
			graph.begin_pan(x, y);
		}
	};

	let (state_mm, tip_mm, relationships_mm) = (state.clone(), tip.clone(), relationships.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(shadow) = shadow_ref.get() else {
			return;
		};
		let shadow: HtmlCanvasElement = shadow.into();
		let (x, y) = pointer_position(&shadow, &ev);
		let mut graph = state_mm.borrow_mut();
		let Some(graph) = graph.as_mut() else {
			return;
		};

		if graph.pan.active {
			graph.move_pan(x, y);
			return;
		}

		let tip = tip_mm.borrow();
		let Some(tip) = tip.as_ref() else {
			return;
		};
		let window = web_sys::window().unwrap();
		match picking::find_target(&context_2d(&shadow), &graph.pool, x, y) {
			Some(PickTarget::Node(index)) => {
				tip.show_node(&window, &graph.data.nodes[index], x, y);
			}
			Some(PickTarget::Link(index)) => {
				let link = &graph.data.links[index];
				let query = RelationshipQuery {
					source: link.source.clone(),
					target: link.target.clone(),
					hall_id: link.hall_id.clone(),
				};
				let key = query.key();
				// cache-then-fetch: ask the host only on a miss, and never
				// wait on the answer
				if !relationships_mm.borrow().contains(&key)
					&& let Some(request) = on_relationship_request
					&& let Some(info) = request.run(query)
				{
					relationships_mm.borrow_mut().insert(key.clone(), info);
				}
				tip.show_link(&window, link, relationships_mm.borrow().get(&key), x, y);
			}
			None => tip.delay_hide(&window),
		}
	};

	let (state_mu, suppress_mu) = (state.clone(), suppress_click.clone());
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut graph) = *state_mu.borrow_mut() {
			suppress_mu.set(graph.end_pan());
		}
	};

	let (state_ml, tip_ml) = (state.clone(), tip.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut graph) = *state_ml.borrow_mut() {
			graph.end_pan();
		}
		if let Some(ref tip) = *tip_ml.borrow() {
			tip.delay_hide(&web_sys::window().unwrap());
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(shadow) = shadow_ref.get() else {
			return;
		};
		let shadow: HtmlCanvasElement = shadow.into();
		let (x, y) = pointer_position(&shadow, &ev);
		if let Some(ref mut graph) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			graph.zoom_by(x, y, factor);
		}
	};

	let (state_click, suppress_cl) = (state.clone(), suppress_click.clone());
	let on_click = move |ev: MouseEvent| {
		if suppress_cl.replace(false) {
			return;
		}
		let Some(shadow) = shadow_ref.get() else {
			return;
		};
		let shadow: HtmlCanvasElement = shadow.into();
		let (x, y) = pointer_position(&shadow, &ev);
		let graph = state_click.borrow();
		let Some(graph) = graph.as_ref() else {
			return;
		};
		match picking::find_target(&context_2d(&shadow), &graph.pool, x, y) {
			Some(PickTarget::Node(index)) => {
				if let Some(callback) = on_node_click {
					callback.run(graph.data.nodes[index].clone());
				}
			}
			Some(PickTarget::Link(index)) => {
				if let Some(callback) = on_link_click {
					callback.run(graph.data.links[index].clone());
				}
			}
			None => {}
		}
	};

	// `on_cleanup` requires a `Send + Sync` closure, but the captured handles
	// are `Rc`-based (this is a single-threaded CSR app); wrap them so the
	// bound is satisfied without changing runtime behavior.
	let cleanup_handles =
		leptos::__reexports::send_wrapper::SendWrapper::new((
			tip.clone(),
			alive.clone(),
			resize_cb.clone(),
		));
	on_cleanup(move || {
		// stop the frame chain and unhook the window listener so repeated
		// mount/unmount cycles do not leak
		let (tip_cleanup, alive_cleanup, resize_cleanup) = &*cleanup_handles;
		alive_cleanup.set(false);
		let window = web_sys::window().unwrap();
		if let Some(ref cb) = *resize_cleanup.borrow() {
			let _ =
				window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		if let Some(ref tip) = *tip_cleanup.borrow() {
			tip.dispose(&window);
		}
	});

	view! {
		<div node_ref=wrapper_ref class="relation-graph" style="position:relative;">
			<canvas node_ref=canvas_ref style="position:absolute;left:0;top:0;" />
			<canvas
				node_ref=shadow_ref
				style="position:absolute;left:0;top:0;opacity:0.01;"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:click=on_click
			/>
		</div>
	}
}
