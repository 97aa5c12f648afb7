use std::fmt::Display;
use std::fmt::Write as _;

use egui::{Pos2, Rect};

use crate::assets::{self, ComponentGraphics, TextFieldGraphics};
use crate::error::SchematicError;
use crate::geometry::{Axis, Direction, Point};

pub const WIRE_PREFIX: &str = "wire";
/// Id carried by router output until it is committed.
pub const GHOST_WIRE_ID: &str = "ghost";
/// Wires are zero-width lines; this gives them something to click on.
pub const WIRE_HIT_MARGIN: f32 = 6.0;

/// Turns a hole in the static tables into the fatal error it is.
fn expect_table<T>(entry: Result<T, SchematicError>) -> T {
    entry.unwrap_or_else(|e| panic!("{e}"))
}

#[derive(serde::Deserialize, serde::Serialize, Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldId {
    Resistance,
    Capacitance,
    Voltage,
}

impl FieldId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resistance => "resistance",
            Self::Capacitance => "capacitance",
            Self::Voltage => "voltage",
        }
    }
}

impl Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection point in world coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: &'static str,
    pub pos: Point,
    /// Which way the port faces into its owner. Wire ends face nowhere.
    pub direction: Option<Direction>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub id: String,
    pub start: Point,
    pub end: Point,
}

impl Wire {
    pub fn new(id: impl Into<String>, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    pub fn ghost(start: Point, end: Point) -> Self {
        Self::new(GHOST_WIRE_ID, start, end)
    }

    pub fn axis(&self) -> Result<Axis, SchematicError> {
        if self.start.x == self.end.x {
            Ok(Axis::Vertical)
        } else if self.start.y == self.end.y {
            Ok(Axis::Horizontal)
        } else {
            Err(SchematicError::SkewedWire {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
            })
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn ports(&self) -> [Port; 2] {
        [
            Port {
                name: "start",
                pos: self.start,
                direction: None,
            },
            Port {
                name: "end",
                pos: self.end,
                direction: None,
            },
        ]
    }

    /// Clickable area: the wire's extent grown by [`WIRE_HIT_MARGIN`] on every side.
    pub fn hit_box(&self) -> Rect {
        Rect::from_two_pos(self.start.to_pos2(), self.end.to_pos2()).expand(WIRE_HIT_MARGIN)
    }

    pub fn display(&self) -> String {
        format!("{} {} -> {}", self.id, self.start, self.end)
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Resistor { resistance: String },
    Capacitor { capacitance: String },
    VoltageSource { voltage: String },
    Ground,
}

impl ComponentKind {
    pub fn resistor() -> Self {
        Self::Resistor {
            resistance: "1k".to_owned(),
        }
    }

    pub fn capacitor() -> Self {
        Self::Capacitor {
            capacitance: "1u".to_owned(),
        }
    }

    pub fn voltage_source() -> Self {
        Self::VoltageSource {
            voltage: "5".to_owned(),
        }
    }

    pub fn graphics(&self) -> &'static ComponentGraphics {
        match self {
            Self::Resistor { .. } => &assets::RESISTOR_GRAPHICS,
            Self::Capacitor { .. } => &assets::CAPACITOR_GRAPHICS,
            Self::VoltageSource { .. } => &assets::VOLTAGE_SOURCE_GRAPHICS,
            Self::Ground => &assets::GROUND_GRAPHICS,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.graphics().symbol
    }

    /// The field typed value shortcuts write to.
    pub fn primary_field(&self) -> Option<FieldId> {
        match self {
            Self::Resistor { .. } => Some(FieldId::Resistance),
            Self::Capacitor { .. } => Some(FieldId::Capacitance),
            Self::VoltageSource { .. } => Some(FieldId::Voltage),
            Self::Ground => None,
        }
    }

    pub fn field(&self, field: FieldId) -> Option<&str> {
        match (self, field) {
            (Self::Resistor { resistance: v }, FieldId::Resistance)
            | (Self::Capacitor { capacitance: v }, FieldId::Capacitance)
            | (Self::VoltageSource { voltage: v }, FieldId::Voltage) => Some(v),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, field: FieldId) -> Option<&mut String> {
        match (self, field) {
            (Self::Resistor { resistance: v }, FieldId::Resistance)
            | (Self::Capacitor { capacitance: v }, FieldId::Capacitance)
            | (Self::VoltageSource { voltage: v }, FieldId::Voltage) => Some(v),
            _ => None,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    /// Anchor on the grid. Every table offset is relative to it.
    pub pos: Point,
    pub rotation: Direction,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(id: impl Into<String>, pos: Point, rotation: Direction, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            pos,
            rotation,
            kind,
        }
    }

    pub fn try_ports(&self) -> Result<Vec<Port>, SchematicError> {
        let ports = self.kind.graphics().ports(self.rotation)?;
        Ok(ports
            .iter()
            .map(|p| Port {
                name: p.name,
                pos: self.pos + p.offset,
                direction: Some(p.facing),
            })
            .collect())
    }

    pub fn ports(&self) -> Vec<Port> {
        expect_table(self.try_ports())
    }

    pub fn bounding_box(&self) -> Rect {
        let local = expect_table(self.kind.graphics().bounding_box(self.rotation));
        local.translate(self.pos.to_vec2())
    }

    pub fn text_fields(&self) -> &'static [TextFieldGraphics] {
        expect_table(self.kind.graphics().text_fields(self.rotation))
    }

    /// World rectangle of a text field.
    pub fn text_rect(&self, field: &TextFieldGraphics) -> Rect {
        field.rect.translate(self.pos.to_vec2())
    }

    pub fn contains(&self, p: Pos2) -> bool {
        self.bounding_box().contains(p)
    }

    /// Stores `value` verbatim. Returns false if the kind has no such field.
    pub fn set_field(&mut self, field: FieldId, value: String) -> bool {
        match self.kind.field_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Rendered text of a field, value followed by the kind's unit.
    pub fn label(&self, field: FieldId) -> Option<String> {
        let value = self.kind.field(field)?;
        let unit = self
            .text_fields()
            .iter()
            .find(|t| t.field == field)
            .map(|t| t.unit)
            .unwrap_or_default();
        Some(format!("{value}{unit}"))
    }

    pub fn display(&self) -> String {
        let value = self
            .kind
            .primary_field()
            .and_then(|f| self.label(f))
            .unwrap_or_default();
        format!(
            "{} {} at {} facing {} {value}",
            self.id,
            self.kind.graphics().name,
            self.pos,
            self.rotation
        )
    }
}

/// Everything placed on the canvas. Insertion order is draw order.
#[derive(Default, serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Schematic {
    pub items: Vec<Component>,
    pub wires: Vec<Wire>,
}

/// Lowest `prefix{n}`, n >= 1, that `taken` rejects. Gaps left by deletions are refilled.
fn lowest_free_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| unreachable!("ran out of ids for {prefix}"))
}

impl Schematic {
    pub fn next_item_id(&self, prefix: &str) -> String {
        lowest_free_id(prefix, |id| self.items.iter().any(|item| item.id == id))
    }

    pub fn next_wire_id(&self) -> String {
        lowest_free_id(WIRE_PREFIX, |id| self.wires.iter().any(|wire| wire.id == id))
    }

    pub fn item_at(&self, pos: Point) -> Option<&Component> {
        self.items.iter().find(|item| item.pos == pos)
    }

    pub fn is_occupied(&self, pos: Point) -> bool {
        self.item_at(pos).is_some()
    }

    pub fn get_item(&self, id: &str) -> Option<&Component> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_item_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Places a new component with a fresh id. Returns `None`, leaving the scene untouched,
    /// if the cell already holds an item.
    pub fn place(
        &mut self,
        kind: ComponentKind,
        rotation: Direction,
        pos: Point,
    ) -> Option<&Component> {
        if self.is_occupied(pos) {
            return None;
        }
        let id = self.next_item_id(kind.symbol());
        self.items.push(Component::new(id, pos, rotation, kind));
        self.items.last()
    }

    /// Gives each segment a fresh wire id and appends it. Returns the new ids.
    pub fn commit_wires(&mut self, segments: Vec<Wire>) -> Vec<String> {
        let mut ids = Vec::with_capacity(segments.len());
        for mut wire in segments {
            if let Err(e) = wire.axis() {
                panic!("{e}");
            }
            if wire.is_degenerate() {
                log::warn!("dropping zero-length wire at {}", wire.start);
                continue;
            }
            wire.id = self.next_wire_id();
            ids.push(wire.id.clone());
            self.wires.push(wire);
        }
        ids
    }

    /// Ports of every item, then of every wire.
    pub fn ports(&self) -> Vec<Port> {
        let mut ports = Vec::new();
        for item in &self.items {
            ports.extend(item.ports());
        }
        for wire in &self.wires {
            ports.extend(wire.ports());
        }
        ports
    }

    /// Removes the item or wire with this id. Ids starting with [`WIRE_PREFIX`] name wires,
    /// everything else names items.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len() + self.wires.len();
        if id.starts_with(WIRE_PREFIX) {
            self.wires.retain(|wire| wire.id != id);
        } else {
            self.items.retain(|item| item.id != id);
        }
        before != self.items.len() + self.wires.len()
    }

    pub fn set_field(&mut self, item_id: &str, field: FieldId, value: String) -> bool {
        self.get_item_mut(item_id)
            .is_some_and(|item| item.set_field(field, value))
    }

    pub fn display(&self) -> String {
        let mut out = String::new();
        writeln!(out, "ITEMS ({} total)", self.items.len()).ok();
        let item_count = self.items.len();
        for (idx, item) in self.items.iter().enumerate() {
            let is_last = idx + 1 == item_count;
            let branch = if is_last { "`-" } else { "|-" };
            let cont = if is_last { "   " } else { "|  " };
            writeln!(out, "{branch} {}", item.display()).ok();

            let ports = item.ports();
            for (port_idx, port) in ports.iter().enumerate() {
                let port_branch = if port_idx + 1 == ports.len() {
                    "`-"
                } else {
                    "|-"
                };
                let facing = port
                    .direction
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_owned());
                writeln!(out, "{cont}{port_branch} {} {} {facing}", port.name, port.pos).ok();
            }
        }

        writeln!(out, "\nWIRES ({} total)", self.wires.len()).ok();
        for wire in &self.wires {
            writeln!(out, "{}", wire.display()).ok();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn resistor_at(x: i32, y: i32) -> Component {
        Component::new("R?", Point::new(x, y), Direction::West, ComponentKind::resistor())
    }

    #[test]
    fn test_ports_are_translated_by_position() {
        let r = resistor_at(160, 0);
        let ports = r.ports();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].pos, Point::new(120, 0));
        assert_eq!(ports[0].direction, Some(Direction::East));
        assert_eq!(ports[1].pos, Point::new(200, 0));
        assert_eq!(ports[1].direction, Some(Direction::West));

        let mut v = resistor_at(0, 0);
        v.rotation = Direction::South;
        let ports = v.ports();
        assert_eq!(ports[0].pos, Point::new(0, -40));
        assert_eq!(ports[0].direction, Some(Direction::South));
        assert_eq!(ports[1].pos, Point::new(0, 40));
    }

    #[test]
    fn test_absolute_port_is_owner_plus_template_offset() {
        for kind in [
            ComponentKind::resistor(),
            ComponentKind::capacitor(),
            ComponentKind::voltage_source(),
            ComponentKind::Ground,
        ] {
            for rotation in [
                Direction::West,
                Direction::North,
                Direction::East,
                Direction::South,
            ] {
                let pos = Point::new(60, -80);
                let c = Component::new("X1", pos, rotation, kind.clone());
                let templates = kind.graphics().ports(rotation).expect("table entry");
                for (port, template) in c.ports().iter().zip(templates.iter()) {
                    assert_eq!(port.pos, pos + template.offset);
                }
            }
        }
    }

    #[test]
    fn test_next_id_refills_gaps() {
        let mut s = Schematic::default();
        for _ in 0..3 {
            let pos = Point::new(s.items.len() as i32 * 100, 0);
            s.place(ComponentKind::resistor(), Direction::West, pos);
        }
        let ids: Vec<&str> = s.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["R1", "R2", "R3"]);

        assert!(s.remove("R1"));
        assert_eq!(s.next_item_id("R"), "R1");
        assert_eq!(s.next_item_id("C"), "C1");
    }

    #[test]
    fn test_ids_stay_unique_across_placements_and_deletions() {
        let mut s = Schematic::default();
        let kinds = [
            ComponentKind::resistor(),
            ComponentKind::capacitor(),
            ComponentKind::Ground,
        ];
        for step in 0..40 {
            let kind = kinds[step % kinds.len()].clone();
            s.place(kind, Direction::West, Point::new(step as i32 * 20, 0));
            if step % 7 == 3 {
                let victim = s.items[step % s.items.len()].id.clone();
                s.remove(&victim);
            }
            for (i, a) in s.items.iter().enumerate() {
                for b in &s.items[i + 1..] {
                    assert_ne!(a.id, b.id, "duplicate id after step {step}");
                }
            }
        }
    }

    #[test]
    fn test_place_on_occupied_cell_is_ignored() {
        let mut s = Schematic::default();
        assert!(s.place(ComponentKind::resistor(), Direction::West, Point::ZERO).is_some());
        let before = s.items.clone();
        assert!(s.place(ComponentKind::capacitor(), Direction::North, Point::ZERO).is_none());
        assert_eq!(s.items, before);
    }

    #[test]
    fn test_commit_wires_assigns_fresh_ids() {
        let mut s = Schematic::default();
        let ids = s.commit_wires(vec![
            Wire::ghost(Point::new(0, 0), Point::new(40, 0)),
            Wire::ghost(Point::new(60, 0), Point::new(100, 0)),
        ]);
        assert_eq!(ids, ["wire1", "wire2"]);
        s.remove("wire1");
        let ids = s.commit_wires(vec![Wire::ghost(Point::new(0, 20), Point::new(0, 60))]);
        assert_eq!(ids, ["wire1"]);
        assert_eq!(s.wires.len(), 2);
    }

    #[test]
    fn test_commit_wires_drops_zero_length_segments() {
        let mut s = Schematic::default();
        let ids = s.commit_wires(vec![Wire::ghost(Point::new(20, 20), Point::new(20, 20))]);
        assert!(ids.is_empty());
        assert!(s.wires.is_empty());
    }

    #[test]
    #[should_panic(expected = "neither horizontal nor vertical")]
    fn test_commit_rejects_skewed_wire() {
        let mut s = Schematic::default();
        s.commit_wires(vec![Wire::ghost(Point::new(0, 0), Point::new(20, 20))]);
    }

    #[test]
    fn test_remove_routes_by_id_prefix() {
        let mut s = Schematic::default();
        s.place(ComponentKind::resistor(), Direction::West, Point::ZERO);
        s.commit_wires(vec![Wire::ghost(Point::new(40, 0), Point::new(80, 0))]);
        assert!(s.remove("wire1"));
        assert_eq!(s.items.len(), 1);
        assert!(s.wires.is_empty());
        assert!(!s.remove("wire1"));
        assert!(s.remove("R1"));
        assert!(s.items.is_empty());
    }

    #[test]
    fn test_field_edit_is_stored_verbatim() {
        let mut s = Schematic::default();
        s.place(ComponentKind::resistor(), Direction::West, Point::ZERO);
        assert!(s.set_field("R1", FieldId::Resistance, "4.7k".to_owned()));
        let r1 = s.get_item("R1").expect("R1 placed");
        assert_eq!(r1.kind.field(FieldId::Resistance), Some("4.7k"));
        assert_eq!(r1.label(FieldId::Resistance).as_deref(), Some("4.7kΩ"));

        assert!(s.set_field("R1", FieldId::Resistance, String::new()));
        let r1 = s.get_item("R1").expect("R1 placed");
        assert_eq!(r1.label(FieldId::Resistance).as_deref(), Some("Ω"));

        assert!(!s.set_field("R1", FieldId::Voltage, "5".to_owned()));
        assert!(!s.set_field("R9", FieldId::Resistance, "5".to_owned()));
    }

    #[test]
    fn test_text_fields_follow_rotation_axis() {
        let mut r = resistor_at(0, 0);
        let fields = r.text_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, FieldId::Resistance);
        assert_eq!(fields[0].align, egui::Align2::CENTER_CENTER);

        r.rotation = Direction::North;
        assert_eq!(r.text_fields()[0].align, egui::Align2::LEFT_CENTER);

        let ground = Component::new("GND1", Point::ZERO, Direction::South, ComponentKind::Ground);
        assert!(ground.text_fields().is_empty());
    }

    #[test]
    fn test_component_box_spans_whole_cells() {
        // 84 by 24 cells from (-42, -12): the last column is 41, the last row 11.
        let r = resistor_at(0, 0);
        assert!(r.contains(pos2(-42.0, -12.0)));
        assert!(r.contains(pos2(41.0, 11.0)));
        assert!(!r.contains(pos2(42.0, 0.0)));
        assert!(!r.contains(pos2(0.0, 12.0)));

        let label = r.text_rect(&r.text_fields()[0]);
        assert!(label.contains(pos2(0.0, 12.0)));
        assert!(label.contains(pos2(29.0, 31.0)));
        assert!(!label.contains(pos2(30.0, 20.0)));
        assert!(!label.contains(pos2(0.0, 32.0)));
    }

    #[test]
    fn test_wire_hit_box_has_margin() {
        let w = Wire::new("wire1", Point::new(0, 0), Point::new(100, 0));
        assert!(w.hit_box().contains(pos2(50.0, 6.0)));
        assert!(w.hit_box().contains(pos2(-6.0, -6.0)));
        assert!(!w.hit_box().contains(pos2(50.0, 7.0)));
        assert!(!w.hit_box().contains(pos2(107.0, 0.0)));
    }

    #[test]
    fn test_wire_axis() {
        let h = Wire::new("w", Point::new(0, 0), Point::new(40, 0));
        let v = Wire::new("w", Point::new(0, 0), Point::new(0, 40));
        let d = Wire::new("w", Point::new(0, 0), Point::new(20, 40));
        assert_eq!(h.axis(), Ok(Axis::Horizontal));
        assert_eq!(v.axis(), Ok(Axis::Vertical));
        assert!(matches!(d.axis(), Err(SchematicError::SkewedWire { .. })));
    }

    #[test]
    fn test_scene_ports_list_items_before_wires() {
        let mut s = Schematic::default();
        s.commit_wires(vec![Wire::ghost(Point::new(40, 0), Point::new(80, 0))]);
        s.place(ComponentKind::Ground, Direction::East, Point::new(200, 0));
        let ports = s.ports();
        let names: Vec<&str> = ports.iter().map(|p| p.name).collect();
        assert_eq!(names, ["p1", "start", "end"]);
        assert_eq!(ports[0].direction, Some(Direction::West));
        assert_eq!(ports[1].direction, None);
    }
}
