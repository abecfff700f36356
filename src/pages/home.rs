use leptos::prelude::*;
use log::info;

use crate::components::relation_graph::{
	GraphData, GraphLink, GraphNode, RelationGraphCanvas, RelationshipInfo, RelationshipQuery,
};

const FILLS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Generate a sample share network: one large hub the rest fan out from.
fn generate_sample_data(n: usize) -> GraphData {
	let nodes: Vec<GraphNode> = (0..n)
		.map(|i| GraphNode {
			id: if i == 0 {
				"topNode".to_owned()
			} else {
				format!("user-{i}")
			},
			name: if i < 10 { Some(format!("User {i}")) } else { None },
			label: if i == 0 { Some(n.to_string()) } else { None },
			symbol_size: if i == 0 { 20.0 } else { 6.0 + (i % 5) as f64 },
			fill: FILLS[i % FILLS.len()].to_owned(),
		})
		.collect();

	let links: Vec<GraphLink> = (1..n)
		.map(|i| {
			let source = (rand_simple(i) * (i as f64)) as usize;
			GraphLink {
				source: nodes[source].id.clone(),
				target: nodes[i].id.clone(),
				hall_id: (i % 7 == 0).then(|| format!("hall-{}", i % 3)),
			}
		})
		.collect();

	GraphData { nodes, links }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(move || generate_sample_data(100));

	let on_node_click = Callback::new(|node: GraphNode| {
		info!("node clicked: {}", node.id);
	});
	let on_link_click = Callback::new(|link: GraphLink| {
		info!("link clicked: {} -> {}", link.source, link.target);
	});
	// stand-in for the relationship service: answer every lookup inline
	let on_relationship_request = Callback::new(|_query: RelationshipQuery| {
		Some(RelationshipInfo {
			share_time: Some("2024-05-01 10:32".to_owned()),
			open_time: Some("2024-05-01 11:05".to_owned()),
			content_id: Some("demo-content".to_owned()),
		})
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<RelationGraphCanvas
					data=graph_data
					fullscreen=true
					tooltip=true
					on_node_click=on_node_click
					on_link_click=on_link_click
					on_relationship_request=on_relationship_request
				/>
				<div class="graph-overlay">
					<h1>"Relation Graph"</h1>
					<p class="subtitle">
						"Scroll to zoom. Drag the background to pan. Click a node or link to inspect it."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
