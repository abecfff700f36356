use super::simulation::Simulation;

/// Gesture zoom bounds. Auto-fit intentionally bypasses them, matching the
/// observed behavior of the layout it reproduces.
pub const SCALE_MIN: f64 = 0.5;
pub const SCALE_MAX: f64 = 20.0;

const FIT_PADDING: f64 = 50.0;
const FIT_PROBE: f64 = 9999.0;

/// The shared scale/translate applied identically to both canvases. Exactly
/// one lives per graph instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub k: f64,
	pub x: f64,
	pub y: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			k: 1.0,
			x: 0.0,
			y: 0.0,
		}
	}
}

/// Owns the live transform plus the canvas dimensions it is relative to.
/// `width`/`height` are the layout dimensions fixed at init; the screen
/// pair tracks window resizes.
pub struct Viewport {
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	pub screen_width: f64,
	pub screen_height: f64,
	auto_fit_locked: bool,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			width,
			height,
			screen_width: width,
			screen_height: height,
			auto_fit_locked: false,
		}
	}

	/// Replace the transform wholesale from a user gesture, clamping the
	/// scale. Taking over manually locks auto-fit for the life of the
	/// instance; a later dataset update does not unlock it.
	pub fn apply_gesture(&mut self, transform: ViewTransform) {
		self.auto_fit_locked = true;
		self.transform = ViewTransform {
			k: transform.k.clamp(SCALE_MIN, SCALE_MAX),
			..transform
		};
	}

	/// The transform a wheel gesture at `(x, y)` would produce: scale by
	/// `factor`, keeping the point under the cursor fixed.
	pub fn zoomed_at(&self, x: f64, y: f64, factor: f64) -> ViewTransform {
		let k = (self.transform.k * factor).clamp(SCALE_MIN, SCALE_MAX);
		let ratio = k / self.transform.k;
		ViewTransform {
			k,
			x: x - (x - self.transform.x) * ratio,
			y: y - (y - self.transform.y) * ratio,
		}
	}

	/// The transform a drag gesture would produce.
	pub fn panned_to(&self, start: ViewTransform, dx: f64, dy: f64) -> ViewTransform {
		ViewTransform {
			x: start.x + dx,
			y: start.y + dy,
			..start
		}
	}

	pub fn auto_fit_locked(&self) -> bool {
		self.auto_fit_locked
	}

	/// Scale the converged layout so its vertical extent (plus padding)
	/// fills the canvas height, centered. The extent comes from probing the
	/// simulation far above and below the canvas for its extreme bodies.
	/// No-op once the user has taken over.
	pub fn fit_to_view(&mut self, simulation: &Simulation) {
		if self.auto_fit_locked {
			return;
		}
		let (Some(top), Some(bottom)) = (
			simulation.find(0.0, -FIT_PROBE),
			simulation.find(0.0, FIT_PROBE),
		) else {
			return;
		};
		let min_y = simulation.bodies()[top].y;
		let max_y = simulation.bodies()[bottom].y;
		let layout_height = max_y - min_y + FIT_PADDING;
		let k = round2(self.height / layout_height);
		self.transform = ViewTransform {
			k,
			x: -self.width * (k - 1.0) / 2.0,
			y: -self.height * (k - 1.0) / 2.0,
		};
	}

	/// Window resize: shift the translation by half the size delta so the
	/// visual center stays put. The zoom factor is untouched.
	pub fn handle_resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.screen_width) / 2.0;
		self.transform.y += (height - self.screen_height) / 2.0;
		self.screen_width = width;
		self.screen_height = height;
	}
}

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
	use super::super::simulation::Simulation;
	use super::super::types::GraphNode;
	use super::*;

	fn node(id: &str, symbol_size: f64) -> GraphNode {
		GraphNode {
			id: id.to_owned(),
			name: None,
			label: None,
			symbol_size,
			fill: "#d62728".to_owned(),
		}
	}

	#[test]
	fn gesture_scale_is_clamped_to_the_extent() {
		let mut viewport = Viewport::new(800.0, 600.0);
		for factor in [0.1, 0.5, 0.9, 1.1, 3.0, 50.0, 0.001] {
			let next = viewport.zoomed_at(120.0, 80.0, factor);
			viewport.apply_gesture(next);
			assert!(viewport.transform.k >= SCALE_MIN);
			assert!(viewport.transform.k <= SCALE_MAX);
		}
	}

	#[test]
	fn zooming_keeps_the_cursor_point_fixed() {
		let mut viewport = Viewport::new(800.0, 600.0);
		viewport.apply_gesture(ViewTransform {
			k: 2.0,
			x: 30.0,
			y: -20.0,
		});
		let (px, py) = (250.0, 180.0);
		// world coordinate under the cursor before the gesture
		let world = (
			(px - viewport.transform.x) / viewport.transform.k,
			(py - viewport.transform.y) / viewport.transform.k,
		);
		let next = viewport.zoomed_at(px, py, 1.5);
		assert!((world.0 * next.k + next.x - px).abs() < 1e-9);
		assert!((world.1 * next.k + next.y - py).abs() < 1e-9);
	}

	#[test]
	fn a_gesture_locks_auto_fit_for_good() {
		let mut viewport = Viewport::new(400.0, 300.0);
		assert!(!viewport.auto_fit_locked());
		viewport.apply_gesture(ViewTransform::default());
		assert!(viewport.auto_fit_locked());

		let nodes = vec![node("topNode", 10.0)];
		let mut simulation = Simulation::new(&nodes, &[], 400.0, 300.0);
		while simulation.running() {
			simulation.tick();
		}
		let before = viewport.transform;
		viewport.fit_to_view(&simulation);
		assert_eq!(viewport.transform, before);
	}

	#[test]
	fn single_node_fit_scales_to_the_padding_extent() {
		let nodes = vec![node("topNode", 10.0)];
		let mut simulation = Simulation::new(&nodes, &[], 400.0, 300.0);
		while simulation.running() {
			simulation.tick();
		}
		let mut viewport = Viewport::new(400.0, 300.0);
		viewport.fit_to_view(&simulation);
		// one node has zero vertical extent, so the layout height is just
		// the fit padding: k = 300 / 50
		assert!((viewport.transform.k - 6.0).abs() < 1e-9);
		assert!((viewport.transform.x - (-400.0 * 5.0 / 2.0)).abs() < 1e-9);
		assert!((viewport.transform.y - (-300.0 * 5.0 / 2.0)).abs() < 1e-9);
	}

	#[test]
	fn fit_scale_is_rounded_to_two_decimals() {
		let nodes = vec![node("a", 4.0), node("b", 4.0), node("c", 4.0)];
		let mut simulation = Simulation::new(&nodes, &[], 640.0, 480.0);
		while simulation.running() {
			simulation.tick();
		}
		let mut viewport = Viewport::new(640.0, 480.0);
		viewport.fit_to_view(&simulation);
		let k = viewport.transform.k;
		assert!((k * 100.0 - (k * 100.0).round()).abs() < 1e-9);
	}

	#[test]
	fn resize_shifts_translation_by_half_the_delta() {
		let mut viewport = Viewport::new(800.0, 600.0);
		viewport.apply_gesture(ViewTransform {
			k: 3.0,
			x: 12.0,
			y: 34.0,
		});
		viewport.handle_resize(1000.0, 500.0);
		assert!((viewport.transform.x - (12.0 + 100.0)).abs() < 1e-9);
		assert!((viewport.transform.y - (34.0 - 50.0)).abs() < 1e-9);
		assert!((viewport.transform.k - 3.0).abs() < 1e-9);
		assert_eq!(viewport.screen_width, 1000.0);
		assert_eq!(viewport.screen_height, 500.0);

		// a second resize shifts relative to the new screen size
		viewport.handle_resize(1000.0, 700.0);
		assert!((viewport.transform.y - (34.0 - 50.0 + 100.0)).abs() < 1e-9);
	}

	#[test]
	fn fit_on_an_empty_dataset_leaves_the_transform_alone() {
		let simulation = Simulation::new(&[], &[], 400.0, 300.0);
		let mut viewport = Viewport::new(400.0, 300.0);
		viewport.fit_to_view(&simulation);
		assert_eq!(viewport.transform, ViewTransform::default());
	}
}
