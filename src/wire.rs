//! Logical wires backed by a growing chain of physical wire parts
use crate::error::StructuralError;
use crate::parts::{Assembly, PartGraph, PartId, PartKind};
use crate::stack::CompileStack;

/// What the first segment of a composite wire is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Plain,
    Switch,
    Button,
}

impl WireKind {
    fn head(self) -> PartKind {
        match self {
            WireKind::Plain => PartKind::Wire,
            WireKind::Switch => PartKind::Switch,
            WireKind::Button => PartKind::Button,
        }
    }
}

/// A wire with unbounded fan-out.
///
/// Each physical wire only has a couple of attachments, so once every segment is
/// saturated a new plain wire is plugged into the tail and takes over.
#[derive(Debug)]
pub struct CompositeWire {
    kind: WireKind,
    segments: Vec<PartId>,
}

impl CompositeWire {
    pub fn new(kind: WireKind, graph: &mut PartGraph) -> Self {
        Self {
            kind,
            segments: vec![graph.add(kind.head())],
        }
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    pub fn segments(&self) -> &[PartId] {
        &self.segments
    }

    /// First segment with a free attachment, growing the chain if there is none.
    fn available_segment(&mut self, graph: &mut PartGraph) -> Result<PartId, StructuralError> {
        if let Some(&segment) = self
            .segments
            .iter()
            .find(|&&s| graph.part(s).has_free_attachment())
        {
            return Ok(segment);
        }

        let tail = self.segments[self.segments.len() - 1];
        let tail_part = graph.part(tail);
        let cup = *tail_part
            .free_cups()
            .first()
            .ok_or(StructuralError::NoFreeCup {
                part: tail_part.kind().name(),
            })?;
        let segment = graph.add(PartKind::Wire);
        graph.connect(segment, tail, cup)?;
        self.segments.push(segment);
        Ok(segment)
    }
}

impl Assembly for CompositeWire {
    fn connect(
        &mut self,
        graph: &mut PartGraph,
        target: PartId,
        cup: u8,
    ) -> Result<(), StructuralError> {
        graph.check_cup(target, cup)?;
        let segment = self.available_segment(graph)?;
        graph.connect(segment, target, cup)
    }

    fn finalize(
        &self,
        graph: &mut PartGraph,
        stack: &mut CompileStack,
    ) -> Result<(), StructuralError> {
        for &segment in &self.segments {
            graph.finalize(segment, stack)?;
        }
        Ok(())
    }

    /// The finalized segment with the most free cups; the earliest one wins ties.
    fn identity(&self, graph: &PartGraph) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for &segment in &self.segments {
            let part = graph.part(segment);
            let Some(serial) = part.serial() else {
                continue;
            };
            let free = part.free_cups().len();
            if best.map_or(true, |(_, most)| free > most) {
                best = Some((serial, free));
            }
        }
        best.map(|(serial, _)| serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{LABEL_CUP, TRI_GATE_INPUT_1, TRI_GATE_INPUT_2, WIRE_CUP_1, WIRE_CUP_2};

    fn gates(graph: &mut PartGraph, count: usize) -> Vec<PartId> {
        (0..count).map(|_| graph.add(PartKind::GateAnd)).collect()
    }

    #[test]
    fn test_grows_instead_of_failing() {
        let mut graph = PartGraph::new();
        let targets = gates(&mut graph, 3);
        let mut wire = CompositeWire::new(WireKind::Plain, &mut graph);

        for &gate in &targets {
            wire.connect(&mut graph, gate, TRI_GATE_INPUT_1).unwrap();
        }
        for &gate in &targets {
            wire.connect(&mut graph, gate, TRI_GATE_INPUT_2).unwrap();
        }

        // two attachments per segment, one of which is spent on chaining
        assert_eq!(wire.segments().len(), 5);
        for pair in wire.segments().windows(2) {
            assert_eq!(graph.part(pair[0]).free_cups(), vec![WIRE_CUP_2]);
        }
        assert!(wire
            .segments()
            .iter()
            .all(|&s| !graph.part(s).has_free_attachment()));
    }

    #[test]
    fn test_switch_head_chains_plain_wires() {
        let mut graph = PartGraph::new();
        let label = graph.add(PartKind::Label);
        let targets = gates(&mut graph, 2);
        let mut wire = CompositeWire::new(WireKind::Switch, &mut graph);

        wire.connect(&mut graph, label, LABEL_CUP).unwrap();
        wire.connect(&mut graph, targets[0], TRI_GATE_INPUT_1).unwrap();
        wire.connect(&mut graph, targets[1], TRI_GATE_INPUT_1).unwrap();

        let kinds: Vec<PartKind> = wire.segments().iter().map(|&s| graph.part(s).kind()).collect();
        assert_eq!(kinds, vec![PartKind::Switch, PartKind::Wire]);
        assert!(graph.part(wire.segments()[0]).free_cups().is_empty());
    }

    #[test]
    fn test_used_cup_does_not_grow_chain() {
        let mut graph = PartGraph::new();
        let gate = graph.add(PartKind::GateNot);
        let mut first = CompositeWire::new(WireKind::Plain, &mut graph);
        let mut second = CompositeWire::new(WireKind::Plain, &mut graph);
        first.connect(&mut graph, gate, 2).unwrap();
        assert!(matches!(
            second.connect(&mut graph, gate, 2),
            Err(StructuralError::CupInUse { .. })
        ));
        assert_eq!(second.segments().len(), 1);
    }

    #[test]
    fn test_identity_prefers_most_free_cups() {
        let mut graph = PartGraph::new();
        let mut stack = CompileStack::new();
        let targets = gates(&mut graph, 3);
        for &gate in &targets {
            graph.finalize(gate, &mut stack).unwrap();
        }
        let mut wire = CompositeWire::new(WireKind::Plain, &mut graph);
        assert_eq!(wire.identity(&graph), None);

        for &gate in &targets {
            wire.connect(&mut graph, gate, TRI_GATE_INPUT_1).unwrap();
        }
        wire.finalize(&mut graph, &mut stack).unwrap();

        // head lost a cup to the chain, the tail still has both
        let segments = wire.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(graph.part(segments[1]).free_cups(), vec![WIRE_CUP_1, WIRE_CUP_2]);
        assert_eq!(wire.identity(&graph), graph.part(segments[1]).serial());
    }

    #[test]
    fn test_identity_of_single_segment() {
        let mut graph = PartGraph::new();
        let mut stack = CompileStack::new();
        let gate = graph.add(PartKind::GateNot);
        graph.finalize(gate, &mut stack).unwrap();
        let mut wire = CompositeWire::new(WireKind::Plain, &mut graph);
        wire.connect(&mut graph, gate, 1).unwrap();
        wire.finalize(&mut graph, &mut stack).unwrap();
        assert_eq!(wire.identity(&graph), Some(2));
    }
}
