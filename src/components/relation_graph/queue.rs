use std::cell::RefCell;

type Repaint = Box<dyn FnOnce()>;

/// Coalesces repaint requests issued within one tick into a single deferred
/// repaint. This is a single-slot, last-writer-discarding gate, not a FIFO
/// queue: the first `add` of a cycle wins the slot, `flush` executes only
/// the most recently registered callback, and requests made while a repaint
/// is executing are dropped.
#[derive(Default)]
pub struct TickQueue {
	inner: RefCell<Inner>,
}

#[derive(Default)]
struct Inner {
	callbacks: Vec<Repaint>,
	pending: bool,
}

impl TickQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a repaint request. Dropped silently while a repaint is
	/// outstanding.
	pub fn add(&self, callback: impl FnOnce() + 'static) {
		let mut inner = self.inner.borrow_mut();
		if !inner.pending {
			inner.callbacks.push(Box::new(callback));
		}
	}

	/// No-op when nothing is registered; otherwise runs the last registered
	/// callback, discards every other one unexecuted, and clears the slot.
	/// Pending is false again once the callback returns, whatever happened
	/// during it.
	pub fn flush(&self) {
		let callback = {
			let mut inner = self.inner.borrow_mut();
			let Some(callback) = inner.callbacks.pop() else {
				return;
			};
			inner.callbacks.clear();
			inner.pending = true;
			callback
		};
		callback();
		self.inner.borrow_mut().pending = false;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	#[test]
	fn flush_runs_only_the_last_registered_callback() {
		let queue = TickQueue::new();
		let ran = Rc::new(Cell::new(0));
		for value in 1..=5 {
			let ran = ran.clone();
			queue.add(move || ran.set(value));
		}
		queue.flush();
		assert_eq!(ran.get(), 5);
	}

	#[test]
	fn at_most_one_callback_executes_per_flush() {
		let queue = TickQueue::new();
		let count = Rc::new(Cell::new(0));
		for _ in 0..10 {
			let count = count.clone();
			queue.add(move || count.set(count.get() + 1));
		}
		queue.flush();
		assert_eq!(count.get(), 1);
		// everything else was discarded, so a second flush is a no-op
		queue.flush();
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn flush_on_empty_queue_is_a_no_op() {
		let queue = TickQueue::new();
		queue.flush();
	}

	#[test]
	fn requests_during_a_flush_are_dropped() {
		let queue = Rc::new(TickQueue::new());
		let reentrant_ran = Rc::new(Cell::new(false));
		{
			let queue_inner = queue.clone();
			let reentrant_ran = reentrant_ran.clone();
			queue.add(move || {
				let reentrant_ran = reentrant_ran.clone();
				queue_inner.add(move || reentrant_ran.set(true));
			});
		}
		queue.flush();
		// the re-entrant add was rejected while pending
		queue.flush();
		assert!(!reentrant_ran.get());
	}

	#[test]
	fn the_gate_reopens_after_a_flush_cycle() {
		let queue = TickQueue::new();
		let ran = Rc::new(Cell::new(0));
		{
			let ran = ran.clone();
			queue.add(move || ran.set(1));
		}
		queue.flush();
		{
			let ran = ran.clone();
			queue.add(move || ran.set(2));
		}
		queue.flush();
		assert_eq!(ran.get(), 2);
	}
}
