//! Physical part catalogue and the connection graph between parts
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::StructuralError;
use crate::stack::{CompileStack, PartRecord, RecordPosition};

// Connection point numbers
pub const WIRE_ATTACHMENT_1: u8 = 1;
pub const WIRE_ATTACHMENT_2: u8 = 3;
pub const WIRE_CUP_1: u8 = 4;
pub const WIRE_CUP_2: u8 = 2;

pub const LABEL_CUP: u8 = 1;
pub const LABEL_ATTACHMENT: u8 = 2;

pub const CONNECTOR_BOTTOM_ATTACHMENT: u8 = 5;
pub const CONNECTOR_TOP_CUP: u8 = 4;
pub const CONNECTOR_FRONT_CUP: u8 = 6;
pub const CONNECTOR_BACK_CUP: u8 = 3;
pub const CONNECTOR_SIDE_CUP_1: u8 = 2;
pub const CONNECTOR_SIDE_CUP_2: u8 = 1;

pub const GATE_ATTACHMENT: u8 = 4;
pub const TRI_GATE_OUTPUT: u8 = 1;
pub const TRI_GATE_INPUT_1: u8 = 2;
pub const TRI_GATE_INPUT_2: u8 = 3;
pub const TWO_GATE_OUTPUT: u8 = 1;
pub const TWO_GATE_INPUT: u8 = 2;

pub const SHORT_STICK_ATTACHMENT: u8 = 1;
pub const SHORT_STICK_CUP: u8 = 2;

pub const GYRO_ATTACHMENT: u8 = 1;

/// Every kind of part the simulation knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    GateAnd,
    GateOr,
    GateNot,
    Connector,
    ShortStick,
    Gyro,
    Label,
    Wire,
    Switch,
    Button,
}

impl PartKind {
    pub fn name(self) -> &'static str {
        match self {
            PartKind::GateAnd => "Gate-AND",
            PartKind::GateOr => "Gate-OR",
            PartKind::GateNot => "Gate-NOT",
            PartKind::Connector => "Connector",
            PartKind::ShortStick => "ShortStick",
            PartKind::Gyro => "Gyro",
            PartKind::Label => "InputSensor",
            PartKind::Wire => "Wire",
            PartKind::Switch => "Switch",
            PartKind::Button => "Button",
        }
    }

    /// Attachments in the order they are handed out.
    pub fn attachments(self) -> &'static [u8] {
        match self {
            PartKind::GateAnd | PartKind::GateOr | PartKind::GateNot => &[GATE_ATTACHMENT],
            PartKind::Connector => &[CONNECTOR_BOTTOM_ATTACHMENT],
            PartKind::ShortStick => &[SHORT_STICK_ATTACHMENT],
            PartKind::Gyro => &[GYRO_ATTACHMENT],
            PartKind::Label => &[LABEL_ATTACHMENT],
            PartKind::Wire => &[WIRE_ATTACHMENT_1, WIRE_ATTACHMENT_2],
            // switches plug in with their second ball first
            PartKind::Switch | PartKind::Button => &[WIRE_ATTACHMENT_2, WIRE_ATTACHMENT_1],
        }
    }

    pub fn cups(self) -> &'static [u8] {
        match self {
            PartKind::GateAnd | PartKind::GateOr => {
                &[TRI_GATE_OUTPUT, TRI_GATE_INPUT_1, TRI_GATE_INPUT_2]
            }
            PartKind::GateNot => &[TWO_GATE_OUTPUT, TWO_GATE_INPUT],
            PartKind::Connector => &[
                CONNECTOR_TOP_CUP,
                CONNECTOR_FRONT_CUP,
                CONNECTOR_BACK_CUP,
                CONNECTOR_SIDE_CUP_1,
                CONNECTOR_SIDE_CUP_2,
            ],
            PartKind::ShortStick => &[SHORT_STICK_CUP],
            PartKind::Gyro => &[],
            PartKind::Label => &[LABEL_CUP],
            PartKind::Wire => &[WIRE_CUP_1, WIRE_CUP_2],
            PartKind::Switch | PartKind::Button => &[WIRE_CUP_2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Per-part key/value data, kept in insertion order.
///
/// Serialized as an object, or as an empty array when there is nothing to say.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraData(Vec<(&'static str, ExtraValue)>);

impl ExtraData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: ExtraValue) -> Self {
        self.0.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ExtraData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_seq(Some(0))?.end();
        }
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Handle to a part owned by a [`PartGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(usize);

#[derive(Debug, Clone, Copy)]
struct Slot {
    number: u8,
    used: bool,
}

fn slots(numbers: &[u8]) -> Vec<Slot> {
    numbers
        .iter()
        .map(|&number| Slot {
            number,
            used: false,
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Link {
    attachment: u8,
    cup: u8,
    target: PartId,
}

#[derive(Debug)]
pub struct Part {
    kind: PartKind,
    attachments: Vec<Slot>,
    cups: Vec<Slot>,
    links: Vec<Link>,
    extra: ExtraData,
    serial: Option<u32>,
}

impl Part {
    fn new(kind: PartKind, extra: ExtraData) -> Self {
        Self {
            kind,
            attachments: slots(kind.attachments()),
            cups: slots(kind.cups()),
            links: Vec::new(),
            extra,
            serial: None,
        }
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn extra(&self) -> &ExtraData {
        &self.extra
    }

    /// Output position assigned at finalization.
    pub fn serial(&self) -> Option<u32> {
        self.serial
    }

    pub fn free_cups(&self) -> Vec<u8> {
        self.cups.iter().filter(|s| !s.used).map(|s| s.number).collect()
    }

    pub fn has_free_attachment(&self) -> bool {
        self.attachments.iter().any(|s| !s.used)
    }
}

/// Arena owning every part built during one compile.
#[derive(Debug, Default)]
pub struct PartGraph {
    parts: Vec<Part>,
}

impl PartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: PartKind) -> PartId {
        self.add_with(kind, ExtraData::new())
    }

    pub fn add_with(&mut self, kind: PartKind, extra: ExtraData) -> PartId {
        self.parts.push(Part::new(kind, extra));
        PartId(self.parts.len() - 1)
    }

    pub fn part(&self, id: PartId) -> &Part {
        &self.parts[id.0]
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Fails unless `cup` exists on `target` and nothing is plugged into it yet.
    pub fn check_cup(&self, target: PartId, cup: u8) -> Result<(), StructuralError> {
        let part = self.part(target);
        match part.cups.iter().find(|s| s.number == cup) {
            None => Err(StructuralError::UnknownCup {
                part: part.kind.name(),
                cup,
            }),
            Some(slot) if slot.used => Err(StructuralError::CupInUse {
                part: part.kind.name(),
                cup,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Plugs the next free attachment of `source` into `cup` of `target`.
    pub fn connect(
        &mut self,
        source: PartId,
        target: PartId,
        cup: u8,
    ) -> Result<(), StructuralError> {
        self.check_cup(target, cup)?;

        let part = &mut self.parts[source.0];
        let name = part.kind.name();
        if part.serial.is_some() {
            return Err(StructuralError::AlreadyFinalized { part: name });
        }
        let slot = part
            .attachments
            .iter_mut()
            .find(|s| !s.used)
            .ok_or(StructuralError::NoFreeAttachment { part: name })?;
        slot.used = true;
        let attachment = slot.number;
        part.links.push(Link {
            attachment,
            cup,
            target,
        });

        if let Some(slot) = self.parts[target.0].cups.iter_mut().find(|s| s.number == cup) {
            slot.used = true;
        }
        Ok(())
    }

    /// Assigns `id` its output position. Every part it references must already have one.
    pub fn finalize(
        &mut self,
        id: PartId,
        stack: &mut CompileStack,
    ) -> Result<u32, StructuralError> {
        let part = self.part(id);
        if part.serial.is_some() {
            return Err(StructuralError::AlreadyFinalized {
                part: part.kind.name(),
            });
        }

        let mut positions = Vec::with_capacity(part.links.len());
        for link in &part.links {
            let target = self.part(link.target);
            let serial = target.serial.ok_or(StructuralError::UnfinalizedDependency {
                part: part.kind.name(),
                dependency: target.kind.name(),
            })?;
            positions.push(RecordPosition(link.attachment, link.cup, serial));
        }

        let serial = stack.append(PartRecord(part.kind.name(), positions, part.extra.clone()));
        log::trace!("finalized {} as #{}", part.kind.name(), serial);
        self.parts[id.0].serial = Some(serial);
        Ok(serial)
    }
}

/// The connect/finalize contract shared by single parts and composite wires.
pub trait Assembly {
    fn connect(
        &mut self,
        graph: &mut PartGraph,
        target: PartId,
        cup: u8,
    ) -> Result<(), StructuralError>;

    fn finalize(
        &self,
        graph: &mut PartGraph,
        stack: &mut CompileStack,
    ) -> Result<(), StructuralError>;

    /// Output position others should refer to, once finalized.
    fn identity(&self, graph: &PartGraph) -> Option<u32>;
}

impl Assembly for PartId {
    fn connect(
        &mut self,
        graph: &mut PartGraph,
        target: PartId,
        cup: u8,
    ) -> Result<(), StructuralError> {
        graph.connect(*self, target, cup)
    }

    fn finalize(
        &self,
        graph: &mut PartGraph,
        stack: &mut CompileStack,
    ) -> Result<(), StructuralError> {
        graph.finalize(*self, stack).map(|_| ())
    }

    fn identity(&self, graph: &PartGraph) -> Option<u32> {
        graph.part(*self).serial
    }
}
