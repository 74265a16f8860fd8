//! Shadow graph of the container's wiring, for human inspection.
//!
//! Two node kinds: type nodes keyed by [`TypeKey`] and provider nodes keyed
//! by location (and scope, for scope-bound registrations). Registration
//! adds dependency edges (input type -> provider) and production edges
//! (provider -> output type); resolution colors nodes as it touches them.
//! The engine never reads the graph back.

use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::io;

/// Resolution status of a graph node. Marks are last-write-wins: a call
/// pre-marks its provider node failed and re-marks it used on success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeStatus {
	Neutral,
	Used,
	Failed,
}

impl NodeStatus {
	fn color(self) -> &'static str {
		match self {
			Self::Neutral => "gray",
			Self::Used => "black",
			Self::Failed => "red",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
	Type,
	Provider,
}

#[derive(Debug)]
pub(crate) struct GraphNode {
	label: String,
	kind: NodeKind,
	status: NodeStatus,
	comment: Option<&'static str>,
}

#[derive(Debug, Default)]
pub(crate) struct DiagnosticGraph {
	graph: DiGraph<GraphNode, ()>,
	type_nodes: HashMap<TypeKey, NodeIndex>,
	location_nodes: HashMap<(Location, Option<Scope>), NodeIndex>,
}

impl DiagnosticGraph {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// The node for a type, created on first use.
	pub(crate) fn type_node(&mut self, key: TypeKey) -> NodeIndex {
		if let Some(&index) = self.type_nodes.get(&key) {
			return index;
		}
		let index = self.graph.add_node(GraphNode {
			label: key.name().to_string(),
			kind: NodeKind::Type,
			status: NodeStatus::Neutral,
			comment: None,
		});
		self.type_nodes.insert(key, index);
		index
	}

	/// The node for a provider registration, created on first use.
	pub(crate) fn location_node(&mut self, location: &Location, scope: Option<&Scope>) -> NodeIndex {
		let node_key = (location.clone(), scope.cloned());
		if let Some(&index) = self.location_nodes.get(&node_key) {
			return index;
		}
		let label = match scope {
			Some(scope) => format!("{} [{}]", location.name(), scope.name()),
			None => location.name().to_string(),
		};
		let index = self.graph.add_node(GraphNode {
			label,
			kind: NodeKind::Provider,
			status: NodeStatus::Neutral,
			comment: None,
		});
		self.location_nodes.insert(node_key, index);
		index
	}

	pub(crate) fn set_comment(&mut self, index: NodeIndex, comment: &'static str) {
		if let Some(node) = self.graph.node_weight_mut(index) {
			node.comment = Some(comment);
		}
	}

	pub(crate) fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
		self.graph.update_edge(from, to, ());
	}

	pub(crate) fn mark_used(&mut self, index: NodeIndex) {
		self.set_status(index, NodeStatus::Used);
	}

	pub(crate) fn mark_failed(&mut self, index: NodeIndex) {
		self.set_status(index, NodeStatus::Failed);
	}

	fn set_status(&mut self, index: NodeIndex, status: NodeStatus) {
		if let Some(node) = self.graph.node_weight_mut(index) {
			node.status = status;
		}
	}

	#[cfg(test)]
	pub(crate) fn status(&self, index: NodeIndex) -> Option<NodeStatus> {
		self.graph.node_weight(index).map(|node| node.status)
	}

	/// Writes the graph in GraphViz DOT form.
	pub(crate) fn render<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
		let dot = Dot::with_attr_getters(
			&self.graph,
			&[Config::EdgeNoLabel, Config::NodeNoLabel],
			&|_, _| String::new(),
			&|_, (_, node)| {
				let mut attrs = format!("label=\"{}\" color={}", node.label, node.status.color());
				if node.kind == NodeKind::Provider {
					attrs.push_str(" shape=box");
				}
				if let Some(comment) = node.comment {
					attrs.push_str(&format!(" comment=\"{comment}\""));
				}
				attrs
			},
		);
		writeln!(writer, "{dot:?}")
	}
}
