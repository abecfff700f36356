use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::color_pool::ColorPool;
use super::simulation::{SimNode, Simulation};
use super::types::{GraphData, PickTarget};
use super::viewport::Viewport;

/// Canvas clear color; must match the reserved color in the pool.
pub const BACKGROUND_CSS: &str = "#fff";
const LINE_CSS: &str = "#bbb";
const LABEL_CSS: &str = "#000";
const ARROW_LENGTH: f64 = 2.0;
const ARROW_SPREAD: f64 = 16.0 * PI / 180.0;
const SHADOW_LINE_WIDTH: f64 = 2.0;

/// A link path with its endpoints pulled to the node circle boundaries.
pub struct LinkGeometry {
	pub sx: f64,
	pub sy: f64,
	pub tx: f64,
	pub ty: f64,
	pub dx: f64,
	pub dy: f64,
}

/// Where a link visually starts and ends: the source->target vector scaled
/// by each node's own radius, so the stroke meets the circle edge rather
/// than the center. `None` when the endpoints coincide.
pub fn link_geometry(source: &SimNode, target: &SimNode) -> Option<LinkGeometry> {
	let dx = target.x - source.x;
	let dy = target.y - source.y;
	let dz = (dx * dx + dy * dy).sqrt();
	if dz == 0.0 {
		return None;
	}
	Some(LinkGeometry {
		sx: source.radius * dx / dz + source.x,
		sy: source.radius * dy / dz + source.y,
		tx: (dz - target.radius) * dx / dz + source.x,
		ty: (dz - target.radius) * dy / dz + source.y,
		dx,
		dy,
	})
}

/// The two wing points of the triangular arrowhead at a link's tip. The
/// side of the line the wings land on is chosen by the sign of the vertical
/// delta alone; this mirrors the rendering it reproduces and is not a
/// general rotation formula.
pub fn arrow_wings(tip: (f64, f64), dx: f64, dy: f64) -> [(f64, f64); 2] {
	let angle = (dx / dy).atan();
	let (tx, ty) = tip;
	if dy > 0.0 {
		[
			(
				tx - ARROW_LENGTH * (angle - ARROW_SPREAD).sin(),
				ty - ARROW_LENGTH * (angle - ARROW_SPREAD).cos(),
			),
			(
				tx - ARROW_LENGTH * (angle + ARROW_SPREAD).sin(),
				ty - ARROW_LENGTH * (angle + ARROW_SPREAD).cos(),
			),
		]
	} else {
		[
			(
				tx + ARROW_LENGTH * (angle - ARROW_SPREAD).sin(),
				ty + ARROW_LENGTH * (angle - ARROW_SPREAD).cos(),
			),
			(
				tx + ARROW_LENGTH * (angle + ARROW_SPREAD).sin(),
				ty + ARROW_LENGTH * (angle + ARROW_SPREAD).cos(),
			),
		]
	}
}

/// Repaint both canvases under the current transform. Always called as one
/// unit so a pointer sample never observes the visible layer out of step
/// with the identity layer. The identity pass only exists once the layout
/// has settled, matching when entities become pickable.
pub fn render(
	data: &GraphData,
	simulation: &Simulation,
	viewport: &Viewport,
	pool: &ColorPool,
	layout_end: bool,
	ctx: &CanvasRenderingContext2d,
	shadow_ctx: &CanvasRenderingContext2d,
) {
	render_visible(data, simulation, viewport, layout_end, ctx);
	if layout_end {
		render_shadow(simulation, viewport, pool, shadow_ctx);
	}
}

fn clear(ctx: &CanvasRenderingContext2d, viewport: &Viewport) {
	ctx.set_fill_style_str(BACKGROUND_CSS);
	ctx.fill_rect(0.0, 0.0, viewport.screen_width, viewport.screen_height);
}

fn render_visible(
	data: &GraphData,
	simulation: &Simulation,
	viewport: &Viewport,
	layout_end: bool,
	ctx: &CanvasRenderingContext2d,
) {
	let transform = viewport.transform;
	clear(ctx, viewport);
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	// links and arrowheads only appear once positions stop moving
	if layout_end {
		let bodies = simulation.bodies();
		for link in simulation.links() {
			let Some(geometry) = link_geometry(&bodies[link.source], &bodies[link.target]) else {
				continue;
			};
			ctx.begin_path();
			ctx.set_line_width((0.15 / transform.k).max(0.15));
			ctx.move_to(geometry.sx, geometry.sy);
			ctx.line_to(geometry.tx, geometry.ty);
			let [first, second] = arrow_wings((geometry.tx, geometry.ty), geometry.dx, geometry.dy);
			ctx.line_to(first.0, first.1);
			ctx.line_to(second.0, second.1);
			ctx.line_to(geometry.tx, geometry.ty);
			ctx.set_fill_style_str(LINE_CSS);
			ctx.set_stroke_style_str(LINE_CSS);
			ctx.fill();
			ctx.stroke();
		}
	}

	for (node, body) in data.nodes.iter().zip(simulation.bodies()) {
		ctx.begin_path();
		let _ = ctx.arc(body.x, body.y, node.symbol_size, 0.0, PI * 2.0);
		ctx.set_fill_style_str(&node.fill);
		ctx.fill();
		if !layout_end {
			continue;
		}
		if let Some(name) = &node.name {
			ctx.set_fill_style_str(LABEL_CSS);
			ctx.set_font("2px serif");
			let _ = ctx.fill_text(
				name,
				body.x + node.symbol_size * 1.1,
				body.y + node.symbol_size / 6.0,
			);
		}
		if let Some(label) = &node.label {
			ctx.set_font(&format!("{}px serif", node.symbol_size));
			ctx.set_fill_style_str("#fff");
			let _ = ctx.fill_text(
				label,
				body.x - (node.symbol_size / 4.0) * label.chars().count() as f64,
				body.y + node.symbol_size / 3.0,
			);
		}
	}
	ctx.restore();
}

// identity pass: flat pool colors, no text, no arrowheads (arrowheads are
// not separately pickable)
fn render_shadow(
	simulation: &Simulation,
	viewport: &Viewport,
	pool: &ColorPool,
	ctx: &CanvasRenderingContext2d,
) {
	let transform = viewport.transform;
	clear(ctx, viewport);
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	let bodies = simulation.bodies();
	for link in simulation.links() {
		let Some(color) = pool.color_for(PickTarget::Link(link.index)) else {
			continue;
		};
		let source = &bodies[link.source];
		let target = &bodies[link.target];
		ctx.begin_path();
		ctx.set_line_width(SHADOW_LINE_WIDTH);
		ctx.move_to(source.x, source.y);
		ctx.line_to(target.x, target.y);
		ctx.set_stroke_style_str(&color.css());
		ctx.stroke();
	}
	for (index, body) in bodies.iter().enumerate() {
		let Some(color) = pool.color_for(PickTarget::Node(index)) else {
			continue;
		};
		ctx.begin_path();
		let _ = ctx.arc(body.x, body.y, body.radius, 0.0, PI * 2.0);
		ctx.set_fill_style_str(&color.css());
		ctx.fill();
	}
	ctx.restore();
}

#[cfg(test)]
mod tests {
	use super::*;

	fn body(x: f64, y: f64, radius: f64) -> SimNode {
		SimNode {
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			radius,
		}
	}

	#[test]
	fn link_endpoints_sit_on_the_circle_boundaries() {
		let source = body(0.0, 0.0, 5.0);
		let target = body(40.0, 30.0, 10.0);
		let geometry = link_geometry(&source, &target).unwrap();
		let start_offset = (geometry.sx.powi(2) + geometry.sy.powi(2)).sqrt();
		assert!((start_offset - 5.0).abs() < 1e-9);
		let end_offset =
			((geometry.tx - 40.0).powi(2) + (geometry.ty - 30.0).powi(2)).sqrt();
		assert!((end_offset - 10.0).abs() < 1e-9);
	}

	#[test]
	fn coincident_endpoints_produce_no_geometry() {
		let source = body(7.0, 7.0, 5.0);
		let target = body(7.0, 7.0, 5.0);
		assert!(link_geometry(&source, &target).is_none());
	}

	#[test]
	fn arrow_side_follows_the_sign_of_the_vertical_delta() {
		let tip = (10.0, 10.0);
		// downward link: wings are pulled back up the line
		let downward = arrow_wings(tip, 4.0, 8.0);
		assert!(downward[0].1 < tip.1);
		assert!(downward[1].1 < tip.1);
		// upward link: the mirrored branch pushes the wings the other way
		let upward = arrow_wings(tip, 4.0, -8.0);
		assert!(upward[0].1 > tip.1);
		assert!(upward[1].1 > tip.1);
	}

	#[test]
	fn arrow_wings_stay_at_the_arrow_length() {
		let tip = (3.0, -2.0);
		for (dx, dy) in [(5.0, 2.0), (-4.0, 6.0), (1.0, -9.0), (3.0, 0.0)] {
			for wing in arrow_wings(tip, dx, dy) {
				let reach = ((wing.0 - tip.0).powi(2) + (wing.1 - tip.1).powi(2)).sqrt();
				assert!((reach - ARROW_LENGTH).abs() < 1e-9, "reach {reach}");
			}
		}
	}

	#[test]
	fn horizontal_links_still_produce_finite_wings() {
		// dy == 0 drives the angle term through atan(inf); both wings must
		// still land at finite coordinates
		let wings = arrow_wings((0.0, 0.0), 5.0, 0.0);
		for wing in wings {
			assert!(wing.0.is_finite() && wing.1.is_finite());
		}
	}
}
