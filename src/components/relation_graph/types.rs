/// A node in the relationship dataset. Positions live in the simulation,
/// index-aligned with this list; the dataset itself is immutable between
/// `update` calls.
#[derive(Clone, Debug)]
pub struct GraphNode {
	pub id: String,
	pub name: Option<String>,
	pub label: Option<String>,
	pub symbol_size: f64,
	pub fill: String,
}

/// A directed link between two nodes, referenced by node id.
#[derive(Clone, Debug)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	pub hall_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// A picked entity: the index refers into the dataset's node or link list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickTarget {
	Node(usize),
	Link(usize),
}
