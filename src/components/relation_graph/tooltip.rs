use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Element, Window};

use super::types::{GraphLink, GraphNode};

const HIDE_DELAY_MS: i32 = 400;

/// Cache key for relationship metadata, `"source-target"` with the hall id
/// appended when the link carries one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelationshipKey(String);

impl RelationshipKey {
	pub fn new(source: &str, target: &str, hall_id: Option<&str>) -> Self {
		match hall_id {
			Some(hall_id) => Self(format!("{source}-{target}-{hall_id}")),
			None => Self(format!("{source}-{target}")),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// A lookup the host is asked to satisfy when the cache misses.
#[derive(Clone, Debug)]
pub struct RelationshipQuery {
	pub source: String,
	pub target: String,
	pub hall_id: Option<String>,
}

impl RelationshipQuery {
	pub fn key(&self) -> RelationshipKey {
		RelationshipKey::new(&self.source, &self.target, self.hall_id.as_deref())
	}
}

/// Relationship metadata shown for a hovered link. Absent fields render as
/// empty, never as an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationshipInfo {
	pub share_time: Option<String>,
	pub open_time: Option<String>,
	pub content_id: Option<String>,
}

/// Session-scoped store for relationship metadata, consulted before asking
/// the host to fetch.
#[derive(Default)]
pub struct RelationshipCache {
	entries: HashMap<RelationshipKey, RelationshipInfo>,
}

impl RelationshipCache {
	pub fn get(&self, key: &RelationshipKey) -> Option<&RelationshipInfo> {
		self.entries.get(key)
	}

	pub fn insert(&mut self, key: RelationshipKey, info: RelationshipInfo) {
		self.entries.insert(key, info);
	}

	pub fn contains(&self, key: &RelationshipKey) -> bool {
		self.entries.contains_key(key)
	}
}

/// Floating detail panel anchored to the pointer. Owns its DOM element and
/// its delayed-hide timer; showing an entity cancels a pending hide, and
/// leaving one arms it again.
pub struct GraphTooltip {
	element: Element,
	hide_timer: Rc<RefCell<Option<i32>>>,
	hide_cb: Closure<dyn FnMut()>,
}

impl GraphTooltip {
	/// Create the tooltip element under `wrapper`. Hidden until an entity
	/// is hovered.
	pub fn new(window: &Window, wrapper: &Element) -> Option<Self> {
		let document = window.document()?;
		let element = document.create_element("div").ok()?;
		element
			.set_attribute("style", &tooltip_style(0.0, 0.0, false))
			.ok()?;
		wrapper.append_child(&element).ok()?;

		let hide_timer = Rc::new(RefCell::new(None));
		let hide_element = element.clone();
		let hide_timer_cb = hide_timer.clone();
		let hide_cb: Closure<dyn FnMut()> = Closure::new(move || {
			let _ = hide_element.set_attribute("style", &tooltip_style(0.0, 0.0, false));
			*hide_timer_cb.borrow_mut() = None;
		});

		Some(Self {
			element,
			hide_timer,
			hide_cb,
		})
	}

	/// Show node details next to the pointer.
	pub fn show_node(&self, window: &Window, node: &GraphNode, x: f64, y: f64) {
		self.cancel_hide(window);
		let name = node.name.as_deref().unwrap_or("");
		let lines = [format!("name: {name}"), format!("id: {}", node.id)];
		self.present(&lines.join("\n"), x, y);
	}

	/// Show link details next to the pointer. `info` is whatever the cache
	/// currently holds; missing metadata renders as empty fields while the
	/// host's fetch is in flight.
	pub fn show_link(
		&self,
		window: &Window,
		link: &GraphLink,
		info: Option<&RelationshipInfo>,
		x: f64,
		y: f64,
	) {
		self.cancel_hide(window);
		let info = info.cloned().unwrap_or_default();
		let lines = [
			format!("share from: {}", link.source),
			format!("share to: {}", link.target),
			format!("share time: {}", info.share_time.unwrap_or_default()),
			format!("open time: {}", info.open_time.unwrap_or_default()),
			format!("content id: {}", info.content_id.unwrap_or_default()),
		];
		self.present(&lines.join("\n"), x, y);
	}

	/// Arm the delayed hide. A later show cancels it.
	pub fn delay_hide(&self, window: &Window) {
		self.cancel_hide(window);
		if let Ok(timer) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
			self.hide_cb.as_ref().unchecked_ref(),
			HIDE_DELAY_MS,
		) {
			*self.hide_timer.borrow_mut() = Some(timer);
		}
	}

	/// Remove the tooltip element and cancel any pending hide.
	pub fn dispose(&self, window: &Window) {
		self.cancel_hide(window);
		self.element.remove();
	}

	fn cancel_hide(&self, window: &Window) {
		if let Some(timer) = self.hide_timer.borrow_mut().take() {
			window.clear_timeout_with_handle(timer);
		}
	}

	fn present(&self, text: &str, x: f64, y: f64) {
		self.element.set_text_content(Some(text));
		let _ = self
			.element
			.set_attribute("style", &tooltip_style(x + 5.0, y + 5.0, true));
	}
}

fn tooltip_style(x: f64, y: f64, visible: bool) -> String {
	let visibility = if visible { "visible" } else { "hidden" };
	format!(
		"position:absolute;left:{x}px;top:{y}px;visibility:{visibility};\
		 background:#fff;border:0.5px solid #aaa;border-radius:8px;\
		 padding:8px 15px;font-size:13px;white-space:pre;pointer-events:none;"
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_omits_the_hall_id_when_absent() {
		assert_eq!(RelationshipKey::new("u1", "u2", None).as_str(), "u1-u2");
	}

	#[test]
	fn key_appends_the_hall_id_when_present() {
		assert_eq!(
			RelationshipKey::new("u1", "u2", Some("h9")).as_str(),
			"u1-u2-h9"
		);
	}

	#[test]
	fn query_key_matches_the_cache_key() {
		let query = RelationshipQuery {
			source: "a".to_owned(),
			target: "b".to_owned(),
			hall_id: Some("h".to_owned()),
		};
		assert_eq!(query.key(), RelationshipKey::new("a", "b", Some("h")));
	}

	#[test]
	fn cache_serves_hits_and_reports_misses() {
		let mut cache = RelationshipCache::default();
		let key = RelationshipKey::new("a", "b", None);
		assert!(cache.get(&key).is_none());
		let info = RelationshipInfo {
			share_time: Some("2024-05-01".to_owned()),
			..Default::default()
		};
		cache.insert(key.clone(), info.clone());
		assert!(cache.contains(&key));
		assert_eq!(cache.get(&key), Some(&info));
		assert!(!cache.contains(&RelationshipKey::new("a", "b", Some("h"))));
	}
}
