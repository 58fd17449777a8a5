//! Ordered primitive chain with explicit downstream target.
//!
//! A [`ChainModel`] owns an input and an output gain node plus an ordered list
//! of internal primitives. Routing is always rebuilt wholesale: every owned
//! node is disconnected, then the chain is reconnected pair by pair. A single
//! failed connection is logged and skipped so one stale node cannot take the
//! rest of the chain down with it.
//!
//! The downstream target is owned by whoever calls [`ChainModel::connect`];
//! the model only ever disconnects its own nodes.

use crate::host::{AudioHost, HostExt, NodeId};

/// Input → effects → output routing with an optional downstream hop.
#[derive(Debug, Clone)]
pub struct ChainModel {
    input: NodeId,
    output: NodeId,
    effects: Vec<NodeId>,
    internal_edges: Option<Vec<(NodeId, NodeId)>>,
    downstream: Option<NodeId>,
    chain: Vec<NodeId>,
    disposed: bool,
}

impl ChainModel {
    /// Creates a chain with fresh unity-gain input and output nodes.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let input = host.create_gain(1.0);
        let output = host.create_gain(1.0);
        Self::from_nodes(input, output)
    }

    /// Creates a chain around existing input and output nodes.
    pub fn from_nodes(input: NodeId, output: NodeId) -> Self {
        Self {
            input,
            output,
            effects: Vec::new(),
            internal_edges: None,
            downstream: None,
            chain: vec![input, output],
            disposed: false,
        }
    }

    /// Sets the internal effects, in signal-flow order.
    #[must_use]
    pub fn with_effects(mut self, effects: Vec<NodeId>) -> Self {
        self.effects = effects;
        self.rebuild_chain();
        self
    }

    /// Appends an internal effect at the end of the chain.
    pub fn push_effect(&mut self, node: NodeId) {
        self.effects.push(node);
        self.rebuild_chain();
    }

    /// Replaces series wiring of the internal segment with explicit edges.
    ///
    /// The edges describe everything from `input` up to the last effect; the
    /// model still adds `last effect -> output` and `output -> downstream`.
    /// Used by kernels with parallel dry/wet paths or feedback loops.
    pub fn set_internal_edges(&mut self, edges: Vec<(NodeId, NodeId)>) {
        self.internal_edges = Some(edges);
    }

    /// The chain's input node.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The chain's output node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Internal effects in signal-flow order.
    pub fn effects(&self) -> &[NodeId] {
        &self.effects
    }

    /// The node currently fed by `output`, if any.
    pub fn downstream(&self) -> Option<NodeId> {
        self.downstream
    }

    /// Full chain: input, effects, output and downstream target.
    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    /// Every node owned by this model.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.input)
            .chain(self.effects.iter().copied())
            .chain(std::iter::once(self.output))
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Sets the downstream target and rebuilds routing.
    pub fn connect(&mut self, host: &mut dyn AudioHost, destination: NodeId) {
        if self.disposed {
            return;
        }
        self.downstream = Some(destination);
        self.rebuild_chain();
        self.route_internal(host);
    }

    /// Disconnects every owned node, then reconnects the chain in order.
    pub fn route_internal(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        for node in self.nodes().collect::<Vec<_>>() {
            host.disconnect_quietly(node);
        }

        match &self.internal_edges {
            Some(edges) => {
                for &(from, to) in edges {
                    host.connect_logged(from, to);
                }
                let tail = self.effects.last().copied().unwrap_or(self.input);
                host.connect_logged(tail, self.output);
                if let Some(next) = self.downstream {
                    host.connect_logged(self.output, next);
                }
            }
            None => {
                for pair in self.chain.windows(2) {
                    host.connect_logged(pair[0], pair[1]);
                }
            }
        }
    }

    /// Unhooks `output` from the downstream target.
    ///
    /// Internal wiring stays in place so reconnecting is cheap.
    pub fn disconnect(&mut self, host: &mut dyn AudioHost) {
        host.disconnect_quietly(self.output);
    }

    /// Disconnects and forgets the chain. Safe to call repeatedly.
    pub fn dispose(&mut self, host: &mut dyn AudioHost) {
        if self.disposed {
            return;
        }
        self.disconnect(host);
        self.effects.clear();
        self.chain.clear();
        self.internal_edges = None;
        self.downstream = None;
        self.disposed = true;
    }

    fn rebuild_chain(&mut self) {
        self.chain.clear();
        self.chain.push(self.input);
        self.chain.extend_from_slice(&self.effects);
        self.chain.push(self.output);
        if let Some(next) = self.downstream {
            self.chain.push(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SignalGraph;

    fn series(graph: &mut SignalGraph, len: usize) -> ChainModel {
        let effects = (0..len).map(|_| graph.create_gain(1.0)).collect();
        ChainModel::new(graph).with_effects(effects)
    }

    #[test]
    fn test_connect_builds_series_path() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 3);
        let sink = graph.create_gain(1.0);

        chain.connect(&mut graph, sink);

        let mut expected = vec![chain.input()];
        expected.extend_from_slice(chain.effects());
        expected.push(chain.output());
        expected.push(sink);
        assert_eq!(graph.linear_path(chain.input(), sink), Some(expected));
        assert_eq!(chain.downstream(), Some(sink));
        assert_eq!(chain.chain().len(), 6);
    }

    #[test]
    fn test_route_internal_is_idempotent() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 2);
        let sink = graph.create_gain(1.0);
        chain.connect(&mut graph, sink);
        let before = graph.edges().to_vec();

        chain.route_internal(&mut graph);
        chain.route_internal(&mut graph);

        let mut after = graph.edges().to_vec();
        let mut before_sorted = before;
        before_sorted.sort_by_key(|e| (e.from, e.to));
        after.sort_by_key(|e| (e.from, e.to));
        assert_eq!(before_sorted, after);
    }

    #[test]
    fn test_route_internal_leaves_downstream_alone() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 1);
        let next = graph.create_gain(1.0);
        let after_next = graph.create_gain(1.0);
        graph.connect(next, after_next).unwrap();

        chain.connect(&mut graph, next);
        assert!(graph.is_connected(next, after_next));
    }

    #[test]
    fn test_failed_connection_does_not_break_chain() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 3);
        let sink = graph.create_gain(1.0);
        let stale = chain.effects()[1];
        graph.refuse_connections(stale);

        chain.connect(&mut graph, sink);

        // Pairs not touching the stale node still connected.
        assert!(graph.is_connected(chain.input(), chain.effects()[0]));
        assert!(graph.is_connected(chain.effects()[2], chain.output()));
        assert!(graph.is_connected(chain.output(), sink));
        assert!(!graph.is_connected(chain.effects()[0], stale));
    }

    #[test]
    fn test_disconnect_only_unhooks_output() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 2);
        let sink = graph.create_gain(1.0);
        chain.connect(&mut graph, sink);

        chain.disconnect(&mut graph);

        assert!(!graph.is_connected(chain.output(), sink));
        assert!(graph.reachable(chain.input(), chain.output()));
    }

    #[test]
    fn test_internal_edges_replace_series() {
        let mut graph = SignalGraph::new(48000.0);
        let dry = graph.create_gain(1.0);
        let wet = graph.create_gain(1.0);
        let level = graph.create_gain(1.0);
        let mut chain = ChainModel::new(&mut graph).with_effects(vec![dry, wet, level]);
        let input = chain.input();
        chain.set_internal_edges(vec![(input, dry), (input, wet), (dry, level), (wet, level)]);
        let sink = graph.create_gain(1.0);

        chain.connect(&mut graph, sink);

        assert_eq!(graph.successors(input), vec![dry, wet]);
        assert!(!graph.is_connected(dry, wet));
        assert!(graph.is_connected(level, chain.output()));
        assert!(graph.is_connected(chain.output(), sink));
    }

    #[test]
    fn test_empty_chain_connects_input_to_output() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = ChainModel::new(&mut graph);
        let sink = graph.create_gain(1.0);
        chain.connect(&mut graph, sink);
        assert_eq!(
            graph.linear_path(chain.input(), sink),
            Some(vec![chain.input(), chain.output(), sink])
        );
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut graph = SignalGraph::new(48000.0);
        let mut chain = series(&mut graph, 2);
        let sink = graph.create_gain(1.0);
        chain.connect(&mut graph, sink);

        chain.dispose(&mut graph);
        chain.dispose(&mut graph);

        assert!(chain.is_disposed());
        assert!(chain.effects().is_empty());
        assert!(!graph.is_connected(chain.output(), sink));

        // Further routing requests are ignored.
        chain.connect(&mut graph, sink);
        assert!(!graph.is_connected(chain.output(), sink));
    }
}
