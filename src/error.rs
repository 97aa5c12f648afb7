use crate::geometry::{Direction, Point};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchematicError {
    /// A per-kind table has nothing on the fallback chain for a rotation. This is a hole in
    /// the static tables in `assets`, never something the user can cause.
    #[error("no {table} entry for {kind} facing {rotation}")]
    MissingTableEntry {
        kind: &'static str,
        table: &'static str,
        rotation: Direction,
    },

    #[error("wire {id} from {start} to {end} is neither horizontal nor vertical")]
    SkewedWire { id: String, start: Point, end: Point },
}
