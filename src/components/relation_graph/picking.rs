use web_sys::CanvasRenderingContext2d;

use super::color_pool::{ColorPool, IdentityColor};
use super::types::PickTarget;

/// Resolve a pointer position to an entity by sampling exactly one pixel of
/// the identity canvas and reverse-mapping its color through the pool. O(1)
/// in the entity count; background pixels, samples outside the canvas, and
/// colors the pool does not know all degrade to "no hit".
pub fn find_target(
	shadow_ctx: &CanvasRenderingContext2d,
	pool: &ColorPool,
	x: f64,
	y: f64,
) -> Option<PickTarget> {
	let image = shadow_ctx.get_image_data(x, y, 1.0, 1.0).ok()?;
	let data = image.data();
	let pixel = [
		data.first().copied()?,
		data.get(1).copied()?,
		data.get(2).copied()?,
		data.get(3).copied()?,
	];
	pool.entity_for(IdentityColor(pixel))
}
