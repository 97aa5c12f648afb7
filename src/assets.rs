use egui::{Align2, Pos2, Rect};

use crate::db::FieldId;
use crate::error::SchematicError;
use crate::geometry::{Axis, Direction, Point};

/// Key of one row in a per-kind table. A lookup for a rotation tries the exact facing, then
/// its axis group, then the catch-all row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKey {
    Facing(Direction),
    Axis(Axis),
    All,
}

impl TableKey {
    pub fn fallback_chain(rotation: Direction) -> [Self; 3] {
        [Self::Facing(rotation), Self::Axis(rotation.axis()), Self::All]
    }
}

pub type Table<T> = &'static [(TableKey, T)];

pub fn resolve<T>(
    table: Table<T>,
    rotation: Direction,
    kind: &'static str,
    what: &'static str,
) -> Result<&'static T, SchematicError> {
    TableKey::fallback_chain(rotation)
        .iter()
        .find_map(|key| table.iter().find(|(k, _)| k == key).map(|(_, v)| v))
        .ok_or(SchematicError::MissingTableEntry {
            kind,
            table: what,
            rotation,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortGraphics {
    pub name: &'static str,
    /// Relative to the owning component's anchor.
    pub offset: Point,
    pub facing: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFieldGraphics {
    pub field: FieldId,
    /// Relative to the owning component's anchor.
    pub rect: Rect,
    pub align: Align2,
    pub unit: &'static str,
}

/// How the base strokes of a kind are mapped onto a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    /// Strokes are drawn horizontally; vertical rotations swap x and y.
    Transpose,
    /// Strokes are drawn facing east and reflected into each of the four rotations.
    Rotate,
}

impl Reflection {
    pub fn apply(self, rotation: Direction, (x, y): (i32, i32)) -> Point {
        match self {
            Self::Transpose => match rotation.axis() {
                Axis::Horizontal => Point::new(x, y),
                Axis::Vertical => Point::new(y, x),
            },
            Self::Rotate => match rotation {
                Direction::East => Point::new(x, y),
                Direction::North => Point::new(-y, -x),
                Direction::West => Point::new(-x, y),
                Direction::South => Point::new(-y, x),
            },
        }
    }
}

pub struct ComponentGraphics {
    pub name: &'static str,
    /// Id prefix for placed components of this kind.
    pub symbol: &'static str,
    pub bounding_boxes: Table<Rect>,
    pub ports: Table<&'static [PortGraphics]>,
    pub text_fields: Table<&'static [TextFieldGraphics]>,
    pub strokes: &'static [&'static [(i32, i32)]],
    pub reflection: Reflection,
}

impl ComponentGraphics {
    pub fn bounding_box(&self, rotation: Direction) -> Result<&'static Rect, SchematicError> {
        resolve(self.bounding_boxes, rotation, self.name, "bounding box")
    }

    pub fn ports(&self, rotation: Direction) -> Result<&'static [PortGraphics], SchematicError> {
        resolve(self.ports, rotation, self.name, "port").copied()
    }

    pub fn text_fields(
        &self,
        rotation: Direction,
    ) -> Result<&'static [TextFieldGraphics], SchematicError> {
        resolve(self.text_fields, rotation, self.name, "text field").copied()
    }

    /// Strokes for a rotation, relative to the anchor.
    pub fn strokes(&self, rotation: Direction) -> Vec<Vec<Point>> {
        self.strokes
            .iter()
            .map(|stroke| {
                stroke
                    .iter()
                    .map(|&xy| self.reflection.apply(rotation, xy))
                    .collect()
            })
            .collect()
    }
}

/// Integer cell rectangle: `w` by `h` cells starting at `(x, y)`, so the last row and
/// column are `x + w - 1` and `y + h - 1`. `Rect::contains` includes `max`.
const fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect {
        min: Pos2::new(x, y),
        max: Pos2::new(x + w - 1.0, y + h - 1.0),
    }
}

const TWO_PORTS_HORIZONTAL: &[PortGraphics] = &[
    PortGraphics {
        name: "p1",
        offset: Point::new(-40, 0),
        facing: Direction::East,
    },
    PortGraphics {
        name: "p2",
        offset: Point::new(40, 0),
        facing: Direction::West,
    },
];

const TWO_PORTS_VERTICAL: &[PortGraphics] = &[
    PortGraphics {
        name: "p1",
        offset: Point::new(0, -40),
        facing: Direction::South,
    },
    PortGraphics {
        name: "p2",
        offset: Point::new(0, 40),
        facing: Direction::North,
    },
];

pub static RESISTOR_GRAPHICS: ComponentGraphics = ComponentGraphics {
    name: "resistor",
    symbol: "R",
    bounding_boxes: &[
        (TableKey::Axis(Axis::Horizontal), rect(-42.0, -12.0, 84.0, 24.0)),
        (TableKey::Axis(Axis::Vertical), rect(-12.0, -42.0, 24.0, 84.0)),
    ],
    ports: &[
        (TableKey::Axis(Axis::Horizontal), TWO_PORTS_HORIZONTAL),
        (TableKey::Axis(Axis::Vertical), TWO_PORTS_VERTICAL),
    ],
    text_fields: &[
        (
            TableKey::Axis(Axis::Horizontal),
            &[TextFieldGraphics {
                field: FieldId::Resistance,
                rect: rect(-30.0, 12.0, 60.0, 20.0),
                align: Align2::CENTER_CENTER,
                unit: "Ω",
            }],
        ),
        (
            TableKey::Axis(Axis::Vertical),
            &[TextFieldGraphics {
                field: FieldId::Resistance,
                rect: rect(15.0, -10.0, 60.0, 20.0),
                align: Align2::LEFT_CENTER,
                unit: "Ω",
            }],
        ),
    ],
    strokes: &[&[
        (-40, 0),
        (-30, 0),
        (-25, -10),
        (-15, 10),
        (-5, -10),
        (5, 10),
        (15, -10),
        (25, 10),
        (30, 0),
        (40, 0),
    ]],
    reflection: Reflection::Transpose,
};

pub static CAPACITOR_GRAPHICS: ComponentGraphics = ComponentGraphics {
    name: "capacitor",
    symbol: "C",
    bounding_boxes: &[
        (TableKey::Axis(Axis::Horizontal), rect(-42.0, -22.0, 84.0, 44.0)),
        (TableKey::Axis(Axis::Vertical), rect(-22.0, -42.0, 44.0, 84.0)),
    ],
    ports: &[
        (TableKey::Axis(Axis::Horizontal), TWO_PORTS_HORIZONTAL),
        (TableKey::Axis(Axis::Vertical), TWO_PORTS_VERTICAL),
    ],
    text_fields: &[
        (
            TableKey::Axis(Axis::Horizontal),
            &[TextFieldGraphics {
                field: FieldId::Capacitance,
                rect: rect(-30.0, 22.0, 60.0, 20.0),
                align: Align2::CENTER_CENTER,
                unit: "F",
            }],
        ),
        (
            TableKey::Axis(Axis::Vertical),
            &[TextFieldGraphics {
                field: FieldId::Capacitance,
                rect: rect(24.0, -10.0, 60.0, 20.0),
                align: Align2::LEFT_CENTER,
                unit: "F",
            }],
        ),
    ],
    strokes: &[
        &[(-40, 0), (-8, 0)],
        &[(-8, -20), (-8, 20)],
        &[(8, -20), (8, 20)],
        &[(8, 0), (40, 0)],
    ],
    reflection: Reflection::Transpose,
};

pub static VOLTAGE_SOURCE_GRAPHICS: ComponentGraphics = ComponentGraphics {
    name: "voltage source",
    symbol: "V",
    bounding_boxes: &[
        (TableKey::Axis(Axis::Horizontal), rect(-42.0, -22.0, 84.0, 44.0)),
        (TableKey::Axis(Axis::Vertical), rect(-22.0, -42.0, 44.0, 84.0)),
    ],
    ports: &[
        (TableKey::Axis(Axis::Horizontal), TWO_PORTS_HORIZONTAL),
        (TableKey::Axis(Axis::Vertical), TWO_PORTS_VERTICAL),
    ],
    text_fields: &[
        (
            TableKey::Axis(Axis::Horizontal),
            &[TextFieldGraphics {
                field: FieldId::Voltage,
                rect: rect(-30.0, 22.0, 60.0, 20.0),
                align: Align2::CENTER_CENTER,
                unit: "V",
            }],
        ),
        (
            TableKey::Axis(Axis::Vertical),
            &[TextFieldGraphics {
                field: FieldId::Voltage,
                rect: rect(24.0, -10.0, 60.0, 20.0),
                align: Align2::LEFT_CENTER,
                unit: "V",
            }],
        ),
    ],
    // Plates of a two-cell battery, positive terminal to the east.
    strokes: &[
        &[(-40, 0), (-15, 0)],
        &[(-15, -12), (-15, 12)],
        &[(-5, -20), (-5, 20)],
        &[(5, -12), (5, 12)],
        &[(15, -20), (15, 20)],
        &[(15, 0), (40, 0)],
    ],
    reflection: Reflection::Rotate,
};

pub static GROUND_GRAPHICS: ComponentGraphics = ComponentGraphics {
    name: "ground",
    symbol: "GND",
    bounding_boxes: &[
        (TableKey::Facing(Direction::West), rect(-2.0, -22.0, 44.0, 44.0)),
        (TableKey::Facing(Direction::North), rect(-22.0, -2.0, 44.0, 44.0)),
        (TableKey::Facing(Direction::East), rect(-42.0, -22.0, 44.0, 44.0)),
        (TableKey::Facing(Direction::South), rect(-22.0, -42.0, 44.0, 44.0)),
    ],
    ports: &[
        (
            TableKey::Facing(Direction::West),
            &[PortGraphics {
                name: "p1",
                offset: Point::ZERO,
                facing: Direction::East,
            }],
        ),
        (
            TableKey::Facing(Direction::North),
            &[PortGraphics {
                name: "p1",
                offset: Point::ZERO,
                facing: Direction::South,
            }],
        ),
        (
            TableKey::Facing(Direction::East),
            &[PortGraphics {
                name: "p1",
                offset: Point::ZERO,
                facing: Direction::West,
            }],
        ),
        (
            TableKey::Facing(Direction::South),
            &[PortGraphics {
                name: "p1",
                offset: Point::ZERO,
                facing: Direction::North,
            }],
        ),
    ],
    text_fields: &[(TableKey::All, &[])],
    strokes: &[
        &[(-20, 0), (0, 0)],
        &[(-20, -15), (-20, 15)],
        &[(-27, -10), (-27, 10)],
        &[(-34, -5), (-34, 5)],
    ],
    reflection: Reflection::Rotate,
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROTATIONS: [Direction; 4] = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];

    #[test]
    fn test_every_kind_resolves_every_rotation() {
        for graphics in [
            &RESISTOR_GRAPHICS,
            &CAPACITOR_GRAPHICS,
            &VOLTAGE_SOURCE_GRAPHICS,
            &GROUND_GRAPHICS,
        ] {
            for r in ALL_ROTATIONS {
                assert!(graphics.bounding_box(r).is_ok(), "{} {r}", graphics.name);
                assert!(graphics.ports(r).is_ok(), "{} {r}", graphics.name);
                assert!(graphics.text_fields(r).is_ok(), "{} {r}", graphics.name);
            }
        }
    }

    #[test]
    fn test_fallback_prefers_exact_facing_over_axis() {
        static TABLE: Table<u8> = &[
            (TableKey::All, 0),
            (TableKey::Axis(Axis::Horizontal), 1),
            (TableKey::Facing(Direction::East), 2),
        ];
        let lookup = |r| resolve(TABLE, r, "test", "number").copied();
        assert_eq!(lookup(Direction::East), Ok(2));
        assert_eq!(lookup(Direction::West), Ok(1));
        assert_eq!(lookup(Direction::North), Ok(0));
    }

    #[test]
    fn test_missing_entry_is_reported() {
        static TABLE: Table<u8> = &[(TableKey::Axis(Axis::Horizontal), 1)];
        let err = resolve(TABLE, Direction::South, "widget", "port")
            .expect_err("vertical rotations have no row");
        assert_eq!(
            err,
            SchematicError::MissingTableEntry {
                kind: "widget",
                table: "port",
                rotation: Direction::South,
            }
        );
        assert_eq!(err.to_string(), "no port entry for widget facing south");
    }

    #[test]
    fn test_transpose_swaps_for_vertical_only() {
        let r = Reflection::Transpose;
        assert_eq!(r.apply(Direction::West, (-25, -10)), Point::new(-25, -10));
        assert_eq!(r.apply(Direction::East, (-25, -10)), Point::new(-25, -10));
        assert_eq!(r.apply(Direction::North, (-25, -10)), Point::new(-10, -25));
        assert_eq!(r.apply(Direction::South, (-25, -10)), Point::new(-10, -25));
    }

    #[test]
    fn test_ground_plates_sit_where_its_port_faces() {
        // Port facings point into the body of a component.
        for r in ALL_ROTATIONS {
            let strokes = GROUND_GRAPHICS.strokes(r);
            let plate = strokes[1][0];
            let port = GROUND_GRAPHICS.ports(r).expect("ground port")[0];
            let facing = match port.facing {
                Direction::East => Point::new(1, 0),
                Direction::West => Point::new(-1, 0),
                Direction::North => Point::new(0, -1),
                Direction::South => Point::new(0, 1),
            };
            let dot = plate.x * facing.x + plate.y * facing.y;
            assert!(dot > 0, "ground facing {r} draws plates on the wrong side");
        }
    }
}
