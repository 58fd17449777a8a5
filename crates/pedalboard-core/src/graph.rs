//! In-memory reference host.
//!
//! [`SignalGraph`] implements [`AudioHost`] by recording topology and parameter
//! state instead of processing audio. Tests use it to assert exact wiring, and
//! the CLI uses it to print a board's signal path.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::host::{AudioBuffer, AudioHost, HostError, NodeId, ParamKind, PrimitiveKind};

/// A directed connection between two primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
}

/// Playback state of a buffer source or capture node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    /// Host time at which playback started.
    pub started_at: Duration,
    /// Offset into the buffer at start.
    pub offset: Duration,
    /// Whether the source loops.
    pub looping: bool,
}

struct NodeRecord {
    kind: PrimitiveKind,
    params: BTreeMap<ParamKind, f32>,
    curve: Option<Vec<f32>>,
    impulse: Option<AudioBuffer>,
    buffer: Option<Arc<AudioBuffer>>,
    playback: Option<Playback>,
    released: bool,
}

impl NodeRecord {
    fn new(kind: PrimitiveKind) -> Self {
        let params = kind.default_params().iter().copied().collect();
        Self {
            kind,
            params,
            curve: None,
            impulse: None,
            buffer: None,
            playback: None,
            released: false,
        }
    }
}

/// Topology-recording [`AudioHost`].
///
/// Connecting an existing edge is a no-op and cycles are allowed, matching
/// the semantics of browser-style audio graphs.
pub struct SignalGraph {
    sample_rate: f32,
    clock: Duration,
    nodes: Vec<NodeRecord>,
    edges: Vec<Edge>,
    destination: NodeId,
    refused: HashSet<NodeId>,
}

impl SignalGraph {
    /// Creates an empty graph holding only the destination node.
    pub fn new(sample_rate: f32) -> Self {
        let mut graph = Self {
            sample_rate,
            clock: Duration::ZERO,
            nodes: Vec::new(),
            edges: Vec::new(),
            destination: NodeId(0),
            refused: HashSet::new(),
        };
        graph.destination = graph.create(PrimitiveKind::Destination);
        graph
    }

    /// Moves the host clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.clock += by;
    }

    /// Makes every future connection touching `node` fail.
    pub fn refuse_connections(&mut self, node: NodeId) {
        self.refused.insert(node);
    }

    /// Lifts a previous [`refuse_connections`](Self::refuse_connections).
    pub fn accept_connections(&mut self, node: NodeId) {
        self.refused.remove(&node);
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes ever created, including released ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes not yet released.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.released).count()
    }

    /// Direct successors of `node` in connection order.
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.from == node)
            .map(|e| e.to)
            .collect()
    }

    /// Direct predecessors of `node` in connection order.
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.to == node)
            .map(|e| e.from)
            .collect()
    }

    /// Returns true if the edge `from -> to` exists.
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.iter().any(|e| e.from == from && e.to == to)
    }

    /// Returns true if `to` can be reached from `from` along any path.
    pub fn reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            if node == to {
                return true;
            }
            if seen.insert(node) {
                queue.extend(self.successors(node));
            }
        }
        false
    }

    /// Follows single-successor hops from `from` until `to`.
    ///
    /// Returns the visited nodes including both endpoints, or `None` if the
    /// walk branches, dead-ends or loops before reaching `to`.
    pub fn linear_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![from];
        let mut current = from;
        while current != to {
            let next = self.successors(current);
            let [next] = next.as_slice() else {
                return None;
            };
            if path.contains(next) {
                return None;
            }
            path.push(*next);
            current = *next;
        }
        Some(path)
    }

    /// Primitive kind of a node.
    pub fn kind(&self, node: NodeId) -> Option<&PrimitiveKind> {
        self.record(node).ok().map(|r| &r.kind)
    }

    /// Installed wave-shaper curve.
    pub fn curve(&self, node: NodeId) -> Option<&[f32]> {
        self.record(node).ok()?.curve.as_deref()
    }

    /// Installed impulse response.
    pub fn impulse(&self, node: NodeId) -> Option<&AudioBuffer> {
        self.record(node).ok()?.impulse.as_ref()
    }

    /// Buffer attached to a source node.
    pub fn buffer(&self, node: NodeId) -> Option<&Arc<AudioBuffer>> {
        self.record(node).ok()?.buffer.as_ref()
    }

    /// Playback state of a source node.
    pub fn playback(&self, node: NodeId) -> Option<Playback> {
        self.record(node).ok()?.playback
    }

    /// Returns true if the source node is currently started.
    pub fn is_playing(&self, node: NodeId) -> bool {
        self.playback(node).is_some()
    }

    /// Returns true if the node has been released.
    pub fn is_released(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.0 as usize)
            .is_some_and(|record| record.released)
    }

    fn record(&self, node: NodeId) -> Result<&NodeRecord, HostError> {
        let record = self
            .nodes
            .get(node.0 as usize)
            .ok_or(HostError::UnknownNode(node))?;
        if record.released {
            return Err(HostError::Released(node));
        }
        Ok(record)
    }

    fn record_mut(&mut self, node: NodeId) -> Result<&mut NodeRecord, HostError> {
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(HostError::UnknownNode(node))?;
        if record.released {
            return Err(HostError::Released(node));
        }
        Ok(record)
    }

    fn unsupported(node: NodeId, record: &NodeRecord, operation: &'static str) -> HostError {
        HostError::UnsupportedOperation {
            node,
            kind: record.kind.label(),
            operation,
        }
    }
}

impl AudioHost for SignalGraph {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn now(&self) -> Duration {
        self.clock
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create(&mut self, kind: PrimitiveKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), HostError> {
        self.record(from)?;
        self.record(to)?;
        if self.refused.contains(&from) || self.refused.contains(&to) {
            return Err(HostError::ConnectionRefused { from, to });
        }
        if !self.is_connected(from, to) {
            self.edges.push(Edge { from, to });
        }
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), HostError> {
        self.record(node)?;
        self.edges.retain(|e| e.from != node);
        Ok(())
    }

    fn set_param(&mut self, node: NodeId, param: ParamKind, value: f32) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if !record.kind.accepts(param) {
            return Err(HostError::UnsupportedParam {
                node,
                kind: record.kind.label(),
                param,
            });
        }
        record.params.insert(param, value);
        Ok(())
    }

    fn param(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.record(node).ok()?.params.get(&param).copied()
    }

    fn set_curve(&mut self, node: NodeId, curve: Vec<f32>) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if !matches!(record.kind, PrimitiveKind::WaveShaper { .. }) {
            return Err(Self::unsupported(node, record, "set_curve"));
        }
        record.curve = Some(curve);
        Ok(())
    }

    fn set_impulse(&mut self, node: NodeId, impulse: AudioBuffer) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if record.kind != PrimitiveKind::Convolver {
            return Err(Self::unsupported(node, record, "set_impulse"));
        }
        record.impulse = Some(impulse);
        Ok(())
    }

    fn set_buffer(&mut self, node: NodeId, buffer: Arc<AudioBuffer>) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if record.kind != PrimitiveKind::BufferSource {
            return Err(Self::unsupported(node, record, "set_buffer"));
        }
        record.buffer = Some(buffer);
        Ok(())
    }

    fn start(&mut self, node: NodeId, offset: Duration, looping: bool) -> Result<(), HostError> {
        let now = self.clock;
        let record = self.record_mut(node)?;
        if !matches!(
            record.kind,
            PrimitiveKind::BufferSource | PrimitiveKind::Capture { .. }
        ) {
            return Err(Self::unsupported(node, record, "start"));
        }
        record.playback = Some(Playback {
            started_at: now,
            offset,
            looping,
        });
        Ok(())
    }

    fn stop(&mut self, node: NodeId) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        record.playback = None;
        Ok(())
    }

    fn release(&mut self, node: NodeId) {
        if let Some(record) = self.nodes.get_mut(node.0 as usize) {
            record.released = true;
            record.playback = None;
            self.edges.retain(|e| e.from != node && e.to != node);
            self.refused.remove(&node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FilterType, HostExt};

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = SignalGraph::new(48000.0);
        let a = graph.create_gain(1.0);
        let b = graph.create_gain(1.0);
        graph.connect(a, b).unwrap();
        graph.connect(a, b).unwrap();
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_disconnect_removes_all_outgoing() {
        let mut graph = SignalGraph::new(48000.0);
        let a = graph.create_gain(1.0);
        let b = graph.create_gain(1.0);
        let c = graph.create_gain(1.0);
        graph.connect(a, b).unwrap();
        graph.connect(a, c).unwrap();
        graph.connect(b, c).unwrap();

        graph.disconnect(a).unwrap();
        assert!(graph.successors(a).is_empty());
        assert!(graph.is_connected(b, c));

        // Disconnecting again is fine.
        graph.disconnect(a).unwrap();
    }

    #[test]
    fn test_unknown_and_released_nodes() {
        let mut graph = SignalGraph::new(48000.0);
        let a = graph.create_gain(1.0);
        let ghost = NodeId(999);
        assert_eq!(graph.connect(a, ghost), Err(HostError::UnknownNode(ghost)));

        let b = graph.create_gain(1.0);
        graph.connect(a, b).unwrap();
        graph.release(b);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.connect(a, b), Err(HostError::Released(b)));
        assert!(graph.is_released(b));
        assert_eq!(graph.live_nodes(), 2);
    }

    #[test]
    fn test_refused_connections() {
        let mut graph = SignalGraph::new(48000.0);
        let a = graph.create_gain(1.0);
        let b = graph.create_gain(1.0);
        graph.refuse_connections(b);
        assert!(matches!(
            graph.connect(a, b),
            Err(HostError::ConnectionRefused { .. })
        ));
        graph.accept_connections(b);
        assert!(graph.connect(a, b).is_ok());
    }

    #[test]
    fn test_params_are_typed() {
        let mut graph = SignalGraph::new(48000.0);
        let filter = graph.create_filter(FilterType::Lowpass, 5000.0, 0.7);
        assert_eq!(graph.param(filter, ParamKind::Frequency), Some(5000.0));
        assert_eq!(graph.param(filter, ParamKind::Q), Some(0.7));
        assert!(graph.set_param(filter, ParamKind::DelayTime, 1.0).is_err());

        let convolver = graph.create(PrimitiveKind::Convolver);
        assert!(graph.set_curve(convolver, vec![0.0]).is_err());
    }

    #[test]
    fn test_linear_path_and_reachability() {
        let mut graph = SignalGraph::new(48000.0);
        let a = graph.create_gain(1.0);
        let b = graph.create_gain(1.0);
        let c = graph.create_gain(1.0);
        let d = graph.create_gain(1.0);
        graph.connect(a, b).unwrap();
        graph.connect(b, c).unwrap();
        assert_eq!(graph.linear_path(a, c), Some(vec![a, b, c]));
        assert!(graph.reachable(a, c));
        assert!(!graph.reachable(c, a));

        // Branching breaks the linear walk but not reachability.
        graph.connect(b, d).unwrap();
        assert_eq!(graph.linear_path(a, c), None);
        assert!(graph.reachable(a, d));

        // Cycles terminate.
        graph.connect(c, b).unwrap();
        assert!(!graph.reachable(c, a));
    }

    #[test]
    fn test_clock_and_playback() {
        let mut graph = SignalGraph::new(48000.0);
        let source = graph.create(PrimitiveKind::BufferSource);
        graph.advance(Duration::from_millis(250));
        graph
            .start(source, Duration::from_secs(1), true)
            .unwrap();
        let playback = graph.playback(source).unwrap();
        assert_eq!(playback.started_at, Duration::from_millis(250));
        assert!(playback.looping);
        graph.stop(source).unwrap();
        assert!(!graph.is_playing(source));
    }
}
