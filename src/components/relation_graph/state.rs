use log::{debug, info};

use super::color_pool::{ColorPool, ColorPoolError};
use super::simulation::Simulation;
use super::types::GraphData;
use super::viewport::{ViewTransform, Viewport};

/// An in-flight background drag.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start: ViewTransform,
}

/// Everything one graph instance owns: the dataset, its simulation and
/// color pool (replaced together on update), the shared viewport, and the
/// flags the frame loop reads. Mutated from the tick and gesture paths,
/// which is sound because both run on the single browser thread.
pub struct GraphState {
	pub data: GraphData,
	pub simulation: Simulation,
	pub pool: ColorPool,
	pub viewport: Viewport,
	pub layout_end: bool,
	pub pan: PanState,
	dirty: bool,
}

impl GraphState {
	pub fn new(
		data: GraphData,
		width: f64,
		height: f64,
		seed: u64,
	) -> Result<Self, ColorPoolError> {
		let simulation = Simulation::new(&data.nodes, &data.links, width, height);
		let pool = ColorPool::new(data.nodes.len(), data.links.len(), seed)?;
		info!(
			"graph initialized: {} nodes, {} links",
			data.nodes.len(),
			data.links.len()
		);
		Ok(Self {
			data,
			simulation,
			pool,
			viewport: Viewport::new(width, height),
			layout_end: false,
			pan: PanState::default(),
			dirty: true,
		})
	}

	/// Replace the dataset. The previous simulation and color pool are
	/// dropped wholesale, so no stale tick can write into the new
	/// positions. The viewport -- including a user's auto-fit lock --
	/// carries over unchanged.
	pub fn update(&mut self, data: GraphData, seed: u64) -> Result<(), ColorPoolError> {
		self.simulation = Simulation::new(
			&data.nodes,
			&data.links,
			self.viewport.width,
			self.viewport.height,
		);
		self.pool = ColorPool::new(data.nodes.len(), data.links.len(), seed)?;
		self.data = data;
		self.layout_end = false;
		self.dirty = true;
		info!(
			"dataset replaced: {} nodes, {} links",
			self.data.nodes.len(),
			self.data.links.len()
		);
		Ok(())
	}

	/// One layout step if the simulation still has energy. The first step
	/// that drains it latches `layout_end`; the flag only resets on
	/// dataset replacement.
	pub fn tick(&mut self) -> bool {
		if !self.simulation.running() {
			return false;
		}
		self.simulation.tick();
		if !self.simulation.running() {
			self.layout_end = true;
			debug!("layout settled; labels, arrows and auto-fit active");
		}
		true
	}

	/// Auto-fit once the layout has settled; a no-op before convergence or
	/// after the user has taken over the viewport.
	pub fn fit_view(&mut self) {
		if self.layout_end {
			self.viewport.fit_to_view(&self.simulation);
		}
	}

	pub fn request_repaint(&mut self) {
		self.dirty = true;
	}

	pub fn take_repaint_request(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}

	/// Wheel zoom about the pointer. Locks auto-fit.
	pub fn zoom_by(&mut self, x: f64, y: f64, factor: f64) {
		let next = self.viewport.zoomed_at(x, y, factor);
		self.viewport.apply_gesture(next);
		self.dirty = true;
	}

	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			transform_start: self.viewport.transform,
		};
	}

	/// Drag pan relative to where the gesture started. Locks auto-fit.
	pub fn move_pan(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		self.pan.moved = true;
		let next = self.viewport.panned_to(
			self.pan.transform_start,
			x - self.pan.start_x,
			y - self.pan.start_y,
		);
		self.viewport.apply_gesture(next);
		self.dirty = true;
	}

	/// Finish a drag; reports whether the pointer actually moved, so a
	/// click at the end of a pan can be ignored.
	pub fn end_pan(&mut self) -> bool {
		let moved = self.pan.moved;
		self.pan = PanState::default();
		moved
	}
}
