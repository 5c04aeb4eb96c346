//! Maps an analyzed name table onto physical parts
use std::collections::HashMap;

use log::debug;

use crate::error::{CompileError, Result};
use crate::flatten::Operation;
use crate::layout::{IoColumn, MountingRack, Scaffold};
use crate::parser::INIT_SIGNAL;
use crate::parts::{
    Assembly, ExtraData, ExtraValue, PartGraph, PartId, PartKind, LABEL_CUP, TRI_GATE_INPUT_1,
    TRI_GATE_INPUT_2, TRI_GATE_OUTPUT, TWO_GATE_INPUT, TWO_GATE_OUTPUT,
};
use crate::semantics::{NameKind, NameTable};
use crate::stack::CompileStack;
use crate::wire::{CompositeWire, WireKind};

const INPUT_LABEL_ROTATION: i64 = -90;
const OUTPUT_LABEL_ROTATION: i64 = 90;

/// Gate part plus the cups its operands and result plug into.
struct GateShape {
    kind: PartKind,
    inputs: &'static [u8],
    output: u8,
}

fn gate_for(op: &Operation) -> Option<GateShape> {
    match op {
        Operation::Alias(_) => None,
        Operation::Not(_) => Some(GateShape {
            kind: PartKind::GateNot,
            inputs: &[TWO_GATE_INPUT],
            output: TWO_GATE_OUTPUT,
        }),
        Operation::And(..) => Some(GateShape {
            kind: PartKind::GateAnd,
            inputs: &[TRI_GATE_INPUT_1, TRI_GATE_INPUT_2],
            output: TRI_GATE_OUTPUT,
        }),
        Operation::Or(..) => Some(GateShape {
            kind: PartKind::GateOr,
            inputs: &[TRI_GATE_INPUT_1, TRI_GATE_INPUT_2],
            output: TRI_GATE_OUTPUT,
        }),
    }
}

fn label(graph: &mut PartGraph, text: &str, rotation: i64) -> PartId {
    graph.add_with(
        PartKind::Label,
        ExtraData::new()
            .with("ActivationKey", ExtraValue::Text(text.to_string()))
            .with("RotationZ", ExtraValue::Int(rotation)),
    )
}

/// Physical state of one `realize` call.
struct Builder<'t> {
    graph: PartGraph,
    wires: Vec<CompositeWire>,
    /// Table name → index into `wires`.
    bound: HashMap<&'t str, usize>,
    input_labels: Vec<PartId>,
    output_labels: Vec<PartId>,
}

impl<'t> Builder<'t> {
    fn new() -> Self {
        Self {
            graph: PartGraph::new(),
            wires: Vec::new(),
            bound: HashMap::new(),
            input_labels: Vec::new(),
            output_labels: Vec::new(),
        }
    }

    fn wire_of(&self, name: &str) -> Result<usize> {
        self.bound
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::Reference {
                name: name.to_string(),
            })
    }

    fn new_wire(&mut self, kind: WireKind) -> usize {
        self.wires.push(CompositeWire::new(kind, &mut self.graph));
        self.wires.len() - 1
    }

    fn input(&mut self, name: &str) -> Result<usize> {
        let sensor = label(&mut self.graph, name, INPUT_LABEL_ROTATION);
        let kind = if name == INIT_SIGNAL {
            WireKind::Button
        } else {
            WireKind::Switch
        };
        let wire = self.new_wire(kind);
        self.wires[wire].connect(&mut self.graph, sensor, LABEL_CUP)?;
        self.input_labels.push(sensor);
        Ok(wire)
    }

    fn gate(
        &mut self,
        shape: GateShape,
        op: &Operation,
        rack: &mut MountingRack,
        stack: &mut CompileStack,
    ) -> Result<usize> {
        let gate = self.graph.add(shape.kind);
        for (operand, &cup) in op.operands().into_iter().zip(shape.inputs) {
            let wire = self.wire_of(operand)?;
            self.wires[wire].connect(&mut self.graph, gate, cup)?;
        }

        let output = self.new_wire(WireKind::Plain);
        self.wires[output].connect(&mut self.graph, gate, shape.output)?;

        rack.mount(&mut self.graph, stack, gate)?;
        gate.finalize(&mut self.graph, stack)?;
        Ok(output)
    }

    fn publish(&mut self, wire: usize, name: &str) -> Result<()> {
        let sensor = label(&mut self.graph, name, OUTPUT_LABEL_ROTATION);
        self.wires[wire].connect(&mut self.graph, sensor, LABEL_CUP)?;
        self.output_labels.push(sensor);
        Ok(())
    }
}

/// Builds the circuit for `table` and appends every part to `stack`, each one
/// after all the parts it references.
pub fn realize(table: &NameTable, stack: &mut CompileStack) -> Result<()> {
    let first = stack.len();
    let mut builder = Builder::new();

    let scaffold = Scaffold::build(&mut builder.graph, stack)?;
    let mut rack = MountingRack::new(&mut builder.graph, stack, scaffold.rack_stick)?;

    for record in table.iter() {
        let wire = match &record.value {
            None => builder.input(&record.declared_as)?,
            Some(op) => match gate_for(op) {
                Some(shape) => builder.gate(shape, op, &mut rack, stack)?,
                None => builder.wire_of(op.operands()[0])?,
            },
        };
        builder.bound.insert(&record.name, wire);

        if record.kind == NameKind::Output {
            builder.publish(wire, &record.declared_as)?;
        }
    }

    debug!(
        "mounted gates on {} rack connectors",
        rack.connectors().len()
    );
    rack.seal(&mut builder.graph, stack)?;

    let column = IoColumn::build(
        &mut builder.graph,
        stack,
        scaffold.column_stick,
        &builder.input_labels,
        &builder.output_labels,
    )?;
    debug!(
        "I/O column holds {} inputs and {} outputs on {} connectors",
        builder.input_labels.len(),
        builder.output_labels.len(),
        column.connectors.len()
    );

    // wires plug into gates and labels, so they go last
    for wire in &builder.wires {
        wire.finalize(&mut builder.graph, stack)?;
    }

    debug!(
        "realized {} names as {} parts",
        table.len(),
        stack.len() - first
    );
    Ok(())
}
