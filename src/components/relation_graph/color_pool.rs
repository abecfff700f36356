use std::collections::HashMap;

use thiserror::Error;

use super::types::PickTarget;

/// The canvas clear color. Never allocated to an entity, and rejected by
/// reverse lookup even before any allocation has happened.
pub const BACKGROUND: IdentityColor = IdentityColor([255, 255, 255, 255]);

const MAX_RANDOM_RETRIES: usize = 64;
const CHANNEL_SPAN: u32 = 255;

/// An opaque RGBA identity color. Channels are drawn in `[1, 255]` so no
/// entity color is ever fully black on any channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdentityColor(pub [u8; 4]);

impl IdentityColor {
	/// Canvas fill/stroke string for this color.
	pub fn css(&self) -> String {
		let [r, g, b, _] = self.0;
		format!("rgba({r},{g},{b},1)")
	}
}

#[derive(Debug, Error)]
pub enum ColorPoolError {
	/// Every color in the space is taken. Only reachable with ~16.7M
	/// entities; surfaced instead of looping forever.
	#[error("identity color space exhausted after {allocated} allocations")]
	Exhausted { allocated: usize },
}

/// Bidirectional registry assigning each node and link a unique identity
/// color. Colors are allocated once per dataset load, links first, and the
/// whole pool is discarded on dataset replacement.
pub struct ColorPool {
	by_target: HashMap<PickTarget, IdentityColor>,
	by_color: HashMap<IdentityColor, PickTarget>,
	rng: u64,
	fallback_cursor: u32,
}

impl ColorPool {
	/// Allocate one color per link, then per node. The order only matters
	/// for reproducibility under a fixed seed.
	pub fn new(node_count: usize, link_count: usize, seed: u64) -> Result<Self, ColorPoolError> {
		let mut pool = Self {
			by_target: HashMap::with_capacity(node_count + link_count),
			by_color: HashMap::with_capacity(node_count + link_count),
			rng: seed | 1,
			fallback_cursor: 0,
		};
		for index in 0..link_count {
			let color = pool.create_color()?;
			pool.insert(PickTarget::Link(index), color);
		}
		for index in 0..node_count {
			let color = pool.create_color()?;
			pool.insert(PickTarget::Node(index), color);
		}
		Ok(pool)
	}

	pub fn color_for(&self, target: PickTarget) -> Option<IdentityColor> {
		self.by_target.get(&target).copied()
	}

	/// Reverse lookup. The background color is permanently reserved and is
	/// rejected here even if it was never allocated.
	pub fn entity_for(&self, color: IdentityColor) -> Option<PickTarget> {
		if color == BACKGROUND {
			return None;
		}
		self.by_color.get(&color).copied()
	}

	fn insert(&mut self, target: PickTarget, color: IdentityColor) {
		self.by_target.insert(target, color);
		self.by_color.insert(color, target);
	}

	/// Draw random candidates until one is free; after a bounded number of
	/// collisions, fall back to a deterministic scan of the color lattice.
	fn create_color(&mut self) -> Result<IdentityColor, ColorPoolError> {
		for _ in 0..MAX_RANDOM_RETRIES {
			let candidate = self.random_color();
			if candidate != BACKGROUND && !self.by_color.contains_key(&candidate) {
				return Ok(candidate);
			}
		}
		self.fallback_color()
	}

	fn random_color(&mut self) -> IdentityColor {
		IdentityColor([
			self.next_channel(),
			self.next_channel(),
			self.next_channel(),
			255,
		])
	}

	// xorshift64; good enough for color dispersion and dependency-free
	fn next_channel(&mut self) -> u8 {
		self.rng ^= self.rng << 13;
		self.rng ^= self.rng >> 7;
		self.rng ^= self.rng << 17;
		(self.rng % u64::from(CHANNEL_SPAN)) as u8 + 1
	}

	/// Counter-to-color bijection over the 255^3 lattice of valid channel
	/// triples. Guarantees termination where the randomized path cannot.
	fn fallback_color(&mut self) -> Result<IdentityColor, ColorPoolError> {
		while self.fallback_cursor < CHANNEL_SPAN * CHANNEL_SPAN * CHANNEL_SPAN {
			let cursor = self.fallback_cursor;
			self.fallback_cursor += 1;
			let color = IdentityColor([
				(cursor % CHANNEL_SPAN) as u8 + 1,
				(cursor / CHANNEL_SPAN % CHANNEL_SPAN) as u8 + 1,
				(cursor / (CHANNEL_SPAN * CHANNEL_SPAN)) as u8 + 1,
				255,
			]);
			if color != BACKGROUND && !self.by_color.contains_key(&color) {
				return Ok(color);
			}
		}
		Err(ColorPoolError::Exhausted {
			allocated: self.by_color.len(),
		})
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn colors_are_pairwise_distinct_and_never_background() {
		let pool = ColorPool::new(500, 500, 7).unwrap();
		let mut seen = HashSet::new();
		for index in 0..500 {
			for target in [PickTarget::Node(index), PickTarget::Link(index)] {
				let color = pool.color_for(target).unwrap();
				assert_ne!(color, BACKGROUND);
				assert!(seen.insert(color), "duplicate color {color:?}");
			}
		}
	}

	#[test]
	fn round_trip_returns_the_original_target() {
		let pool = ColorPool::new(40, 25, 99).unwrap();
		for index in 0..40 {
			let color = pool.color_for(PickTarget::Node(index)).unwrap();
			assert_eq!(pool.entity_for(color), Some(PickTarget::Node(index)));
		}
		for index in 0..25 {
			let color = pool.color_for(PickTarget::Link(index)).unwrap();
			assert_eq!(pool.entity_for(color), Some(PickTarget::Link(index)));
		}
	}

	#[test]
	fn background_is_reserved_even_when_never_allocated() {
		let pool = ColorPool::new(1, 0, 3).unwrap();
		assert_eq!(pool.entity_for(BACKGROUND), None);
	}

	#[test]
	fn unknown_colors_resolve_to_nothing() {
		let pool = ColorPool::new(0, 0, 1).unwrap();
		assert_eq!(pool.entity_for(IdentityColor([1, 2, 3, 255])), None);
	}

	#[test]
	fn same_seed_reproduces_the_same_allocation() {
		let a = ColorPool::new(30, 30, 42).unwrap();
		let b = ColorPool::new(30, 30, 42).unwrap();
		for index in 0..30 {
			assert_eq!(
				a.color_for(PickTarget::Link(index)),
				b.color_for(PickTarget::Link(index))
			);
			assert_eq!(
				a.color_for(PickTarget::Node(index)),
				b.color_for(PickTarget::Node(index))
			);
		}
	}

	#[test]
	fn channels_stay_inside_the_valid_range() {
		let pool = ColorPool::new(200, 0, 5).unwrap();
		for index in 0..200 {
			let IdentityColor([r, g, b, a]) = pool.color_for(PickTarget::Node(index)).unwrap();
			assert!(r >= 1 && g >= 1 && b >= 1);
			assert_eq!(a, 255);
		}
	}

	#[test]
	fn css_string_is_canvas_compatible() {
		assert_eq!(IdentityColor([12, 200, 3, 255]).css(), "rgba(12,200,3,1)");
	}
}
