//! Orthogonal wire routing for a drag from one grid point to another.
//!
//! A drag is reduced to a straight run along its dominant axis. The run is broken where it
//! passes through ports already sitting on the line, so a new wire never lies on top of a
//! connection that is already there.

use crate::db::{Port, Wire};
use crate::geometry::{Axis, Point};

/// Segments for a drag from `start` to `end`, given every port in the scene.
///
/// The result carries ghost ids; the caller assigns real ones on commit.
pub fn route(start: Point, end: Point, ports: &[Port]) -> Vec<Wire> {
    let offset = end - start;
    if offset == Point::ZERO {
        return Vec::new();
    }

    let axis = if offset.x.abs() > offset.y.abs() {
        Axis::Horizontal
    } else {
        Axis::Vertical
    };
    let end = axis.project(start, end);
    let forward = axis.along(offset) > 0;
    let [behind, ahead] = axis.facings(forward);

    let lo = axis.along(start).min(axis.along(end));
    let hi = axis.along(start).max(axis.along(end));
    let mut on_line: Vec<&Port> = ports
        .iter()
        .filter(|p| {
            axis.across(p.pos) == axis.across(start) && (lo..=hi).contains(&axis.along(p.pos))
        })
        .collect();

    // At a shared coordinate a port facing ahead comes after one facing behind, so the run
    // reaches a junction before it leaves it.
    let sign = if forward { 1 } else { -1 };
    on_line.sort_by_key(|p| (axis.along(p.pos) * sign, p.direction == Some(ahead)));

    let mut segments = Vec::new();
    let mut drawing = true;
    let mut cursor = start;
    for port in on_line {
        if drawing && port.pos != cursor {
            segments.push(Wire::ghost(cursor, port.pos));
        }
        if port.direction == Some(ahead) {
            drawing = false;
        } else if port.direction == Some(behind) {
            drawing = true;
        }
        cursor = port.pos;
    }
    if drawing && cursor != end {
        segments.push(Wire::ghost(cursor, end));
    }

    debug_assert!(
        segments.iter().all(|w| w.axis().is_ok()),
        "router produced a skewed wire"
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Component, ComponentKind, Schematic};
    use crate::geometry::Direction;

    fn resistor(x: i32, y: i32, rotation: Direction) -> Component {
        Component::new("R", Point::new(x, y), rotation, ComponentKind::resistor())
    }

    /// Segment ends ordered along the axis, so tests don't depend on travel direction.
    fn span(w: &Wire) -> (Point, Point) {
        if (w.start.x, w.start.y) <= (w.end.x, w.end.y) {
            (w.start, w.end)
        } else {
            (w.end, w.start)
        }
    }

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_same_point_routes_to_nothing() {
        let ports = resistor(0, 0, Direction::West).ports();
        for x in [-40, 0, 40, 100] {
            for y in [-20, 0, 20] {
                assert!(route(p(x, y), p(x, y), &ports).is_empty());
            }
        }
    }

    #[test]
    fn test_empty_scene_gives_single_segment() {
        let wires = route(p(0, 0), p(100, 0), &[]);
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].start, p(0, 0));
        assert_eq!(wires[0].end, p(100, 0));
        assert_eq!(wires[0].id, crate::db::GHOST_WIRE_ID);
    }

    #[test]
    fn test_diagonal_drag_follows_dominant_axis() {
        let wires = route(p(0, 0), p(100, 40), &[]);
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].end, p(100, 0));

        let wires = route(p(0, 0), p(-40, -100), &[]);
        assert_eq!(wires[0].end, p(0, -100));

        // Equal offsets resolve to vertical.
        let wires = route(p(0, 0), p(60, 60), &[]);
        assert_eq!(wires[0].end, p(0, 60));
    }

    #[test]
    fn test_leftward_from_resistor_port() {
        let scene_ports = resistor(0, 0, Direction::West).ports();
        let wires = route(p(-40, 0), p(-200, 0), &scene_ports);
        assert_eq!(wires.len(), 1);
        assert_eq!(span(&wires[0]), (p(-200, 0), p(-40, 0)));
    }

    #[test]
    fn test_between_two_resistors() {
        let mut ports = resistor(0, 0, Direction::West).ports();
        ports.extend(resistor(160, 0, Direction::West).ports());
        let wires = route(p(40, 0), p(120, 0), &ports);
        assert_eq!(wires.len(), 1);
        assert_eq!(span(&wires[0]), (p(40, 0), p(120, 0)));
    }

    #[test]
    fn test_route_skips_over_component_body() {
        // Dragging straight through a horizontal resistor leaves the body undrawn.
        let ports = resistor(0, 0, Direction::West).ports();
        let wires = route(p(-100, 0), p(100, 0), &ports);
        let spans: Vec<_> = wires.iter().map(span).collect();
        assert_eq!(spans, [(p(-100, 0), p(-40, 0)), (p(40, 0), p(100, 0))]);

        let wires = route(p(100, 0), p(-100, 0), &ports);
        let spans: Vec<_> = wires.iter().map(span).collect();
        assert_eq!(spans, [(p(40, 0), p(100, 0)), (p(-100, 0), p(-40, 0))]);
    }

    #[test]
    fn test_vertical_route_through_vertical_component() {
        let ports = resistor(0, 0, Direction::North).ports();
        let wires = route(p(0, -100), p(0, 100), &ports);
        let spans: Vec<_> = wires.iter().map(span).collect();
        assert_eq!(spans, [(p(0, -100), p(0, -40)), (p(0, 40), p(0, 100))]);
    }

    #[test]
    fn test_ports_off_the_line_are_ignored() {
        let ports = resistor(0, 20, Direction::West).ports();
        let wires = route(p(-100, 0), p(100, 0), &ports);
        assert_eq!(wires.len(), 1);
    }

    #[test]
    fn test_wire_ends_do_not_change_pen_state() {
        let mut s = Schematic::default();
        s.commit_wires(vec![Wire::ghost(p(40, -40), p(40, 0))]);
        let wires = route(p(0, 0), p(100, 0), &s.ports());
        let spans: Vec<_> = wires.iter().map(span).collect();
        assert_eq!(spans, [(p(0, 0), p(40, 0)), (p(40, 0), p(100, 0))]);
    }

    #[test]
    fn test_junction_is_entered_before_it_is_left() {
        // Two grounds share a point: one faces behind the travel direction, one ahead.
        // Listed ahead-first to check the ordering does not depend on input order.
        let ports = vec![
            Port {
                name: "p1",
                pos: p(60, 0),
                direction: Some(Direction::East),
            },
            Port {
                name: "p1",
                pos: p(60, 0),
                direction: Some(Direction::West),
            },
        ];
        // Travelling east: the west-facing port resumes, then the east-facing one stops.
        let wires = route(p(0, 0), p(120, 0), &ports);
        let spans: Vec<_> = wires.iter().map(span).collect();
        assert_eq!(spans, [(p(0, 0), p(60, 0))]);
    }

    #[test]
    fn test_segments_are_axis_aligned_and_disjoint() {
        let mut s = Schematic::default();
        s.place(ComponentKind::resistor(), Direction::West, p(0, 0));
        s.place(ComponentKind::capacitor(), Direction::North, p(200, 0));
        s.place(ComponentKind::Ground, Direction::East, p(-160, 0));
        s.place(ComponentKind::voltage_source(), Direction::South, p(0, 160));
        s.commit_wires(vec![Wire::ghost(p(80, 0), p(80, 80))]);
        let ports = s.ports();

        let starts = [p(-200, 0), p(0, 0), p(0, -200), p(120, 0), p(0, 300)];
        let ends = [p(300, 0), p(-300, 20), p(0, 300), p(20, -260), p(-20, -60)];
        for &a in &starts {
            for &b in &ends {
                let wires = route(a, b, &ports);
                for w in &wires {
                    assert!(
                        w.start.x == w.end.x || w.start.y == w.end.y,
                        "skewed segment {w:?}"
                    );
                    assert_ne!(w.start, w.end, "zero-length segment");
                }

                // Projected onto the travel axis the segments are in order, inside the
                // interval, and never overlap. Every stretch left undrawn starts at a port
                // facing ahead and ends at a port facing behind or at the endpoint.
                let offset = b - a;
                let axis = if offset.x.abs() > offset.y.abs() {
                    Axis::Horizontal
                } else {
                    Axis::Vertical
                };
                let end = axis.project(a, b);
                let sign = if axis.along(offset) > 0 { 1 } else { -1 };
                let [behind, ahead] = axis.facings(sign > 0);
                let end_along = axis.along(end) * sign;
                let faces_at = |at: i32, facing: Direction| {
                    ports.iter().any(|port| {
                        axis.across(port.pos) == axis.across(a)
                            && axis.along(port.pos) * sign == at
                            && port.direction == Some(facing)
                    })
                };
                let check_gap = |from: i32, to: i32| {
                    if to > from {
                        assert!(
                            faces_at(from, ahead),
                            "gap routing {a} -> {b} does not start at a port facing {ahead}"
                        );
                        assert!(
                            to == end_along || faces_at(to, behind),
                            "gap routing {a} -> {b} does not end at a port facing {behind}"
                        );
                    }
                };

                let mut reached = axis.along(a) * sign;
                for w in &wires {
                    let from = axis.along(w.start) * sign;
                    let to = axis.along(w.end) * sign;
                    assert!(from >= reached, "overlap routing {a} -> {b}");
                    assert!(to > from, "backwards segment routing {a} -> {b}");
                    assert_eq!(axis.across(w.start), axis.across(a));
                    check_gap(reached, from);
                    reached = to;
                }
                assert!(reached <= end_along);
                check_gap(reached, end_along);
            }
        }
    }
}
