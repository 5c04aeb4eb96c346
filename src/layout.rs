//! Structural placement: the base platform, the gate rack and the I/O column
use log::debug;

use crate::error::StructuralError;
use crate::parts::{
    Assembly, ExtraData, ExtraValue, PartGraph, PartId, PartKind, CONNECTOR_BACK_CUP,
    CONNECTOR_FRONT_CUP, CONNECTOR_SIDE_CUP_1, CONNECTOR_SIDE_CUP_2, CONNECTOR_TOP_CUP,
    SHORT_STICK_CUP,
};
use crate::stack::CompileStack;

/// Rotation of extension connectors in the gate rack.
const RACK_EXTENSION_ROTATION: i64 = 180;

/// The fixed platform every program is built on.
pub struct Scaffold {
    /// Stick the gate rack grows from.
    pub rack_stick: PartId,
    /// Stick the I/O column grows from.
    pub column_stick: PartId,
}

fn gyro(graph: &mut PartGraph) -> PartId {
    graph.add_with(
        PartKind::Gyro,
        ExtraData::new().with("Active", ExtraValue::Bool(true)),
    )
}

impl Scaffold {
    pub fn build(
        graph: &mut PartGraph,
        stack: &mut CompileStack,
    ) -> Result<Scaffold, StructuralError> {
        let base = graph.add(PartKind::Connector);
        let stick1 = graph.add(PartKind::ShortStick);
        let stick2 = graph.add(PartKind::ShortStick);
        graph.connect(stick1, base, CONNECTOR_FRONT_CUP)?;
        graph.connect(stick2, base, CONNECTOR_BACK_CUP)?;

        let left = graph.add(PartKind::Connector);
        let right = graph.add(PartKind::Connector);
        graph.connect(left, stick1, SHORT_STICK_CUP)?;
        graph.connect(right, stick2, SHORT_STICK_CUP)?;

        let stick3 = graph.add(PartKind::ShortStick);
        let stick4 = graph.add(PartKind::ShortStick);

        let gyros = [gyro(graph), gyro(graph), gyro(graph), gyro(graph)];
        graph.connect(gyros[0], base, CONNECTOR_SIDE_CUP_1)?;
        graph.connect(gyros[1], base, CONNECTOR_SIDE_CUP_2)?;
        graph.connect(gyros[2], left, CONNECTOR_TOP_CUP)?;
        graph.connect(gyros[3], right, CONNECTOR_TOP_CUP)?;

        graph.connect(stick3, left, CONNECTOR_FRONT_CUP)?;
        graph.connect(stick4, right, CONNECTOR_FRONT_CUP)?;

        for part in [base, stick1, stick2, left, right, stick3, stick4] {
            part.finalize(graph, stack)?;
        }
        for part in gyros {
            part.finalize(graph, stack)?;
        }

        Ok(Scaffold {
            rack_stick: stick3,
            column_stick: stick4,
        })
    }
}

/// Rolling chain of connectors that gates are mounted on.
///
/// The top cup of each connector is kept for the next connector in the chain.
pub struct MountingRack {
    connectors: Vec<PartId>,
}

fn mounting_cups(graph: &PartGraph, connector: PartId) -> Vec<u8> {
    graph
        .part(connector)
        .free_cups()
        .into_iter()
        .filter(|&cup| cup != CONNECTOR_TOP_CUP)
        .collect()
}

impl MountingRack {
    pub fn new(
        graph: &mut PartGraph,
        stack: &mut CompileStack,
        stick: PartId,
    ) -> Result<Self, StructuralError> {
        let base = graph.add(PartKind::Connector);
        graph.connect(base, stick, SHORT_STICK_CUP)?;
        base.finalize(graph, stack)?;
        Ok(Self {
            connectors: vec![base],
        })
    }

    pub fn connectors(&self) -> &[PartId] {
        &self.connectors
    }

    fn last(&self) -> PartId {
        self.connectors[self.connectors.len() - 1]
    }

    pub fn mount(
        &mut self,
        graph: &mut PartGraph,
        stack: &mut CompileStack,
        gate: PartId,
    ) -> Result<(), StructuralError> {
        let mut connector = self.last();
        let mut cups = mounting_cups(graph, connector);

        if cups.is_empty() {
            let extension = graph.add_with(
                PartKind::Connector,
                ExtraData::new().with("RotationZ", ExtraValue::Int(RACK_EXTENSION_ROTATION)),
            );
            graph.connect(extension, connector, CONNECTOR_TOP_CUP)?;
            extension.finalize(graph, stack)?;
            self.connectors.push(extension);
            debug!("gate rack extended to {} connectors", self.connectors.len());

            connector = extension;
            cups = mounting_cups(graph, connector);
        }

        let cup = *cups.first().ok_or(StructuralError::NoFreeCup {
            part: PartKind::Connector.name(),
        })?;
        graph.connect(gate, connector, cup)
    }

    /// Caps the chain with a trailing connector.
    pub fn seal(
        self,
        graph: &mut PartGraph,
        stack: &mut CompileStack,
    ) -> Result<PartId, StructuralError> {
        let cap = graph.add(PartKind::Connector);
        graph.connect(cap, self.last(), CONNECTOR_TOP_CUP)?;
        cap.finalize(graph, stack)?;
        Ok(cap)
    }
}

/// Column of stacked connectors holding the input labels at the front and
/// the output labels at the back, one every other connector.
pub struct IoColumn {
    pub connectors: Vec<PartId>,
}

impl IoColumn {
    pub fn height(inputs: usize, outputs: usize) -> usize {
        2 * inputs.max(outputs)
    }

    pub fn build(
        graph: &mut PartGraph,
        stack: &mut CompileStack,
        stick: PartId,
        inputs: &[PartId],
        outputs: &[PartId],
    ) -> Result<IoColumn, StructuralError> {
        let base = graph.add(PartKind::Connector);
        graph.connect(base, stick, SHORT_STICK_CUP)?;
        let mut connectors = vec![base];

        for _ in 0..Self::height(inputs.len(), outputs.len()) {
            let connector = graph.add(PartKind::Connector);
            graph.connect(connector, connectors[connectors.len() - 1], CONNECTOR_TOP_CUP)?;
            connectors.push(connector);
        }

        for (i, &label) in inputs.iter().enumerate() {
            graph.connect(label, connectors[i * 2], CONNECTOR_FRONT_CUP)?;
        }
        for (i, &label) in outputs.iter().enumerate() {
            graph.connect(label, connectors[i * 2], CONNECTOR_BACK_CUP)?;
        }

        for connector in &connectors {
            connector.finalize(graph, stack)?;
        }
        for label in inputs.iter().chain(outputs) {
            label.finalize(graph, stack)?;
        }

        Ok(IoColumn { connectors })
    }
}
