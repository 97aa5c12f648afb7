use egui::{Align2, Pos2, Rect, vec2};

use crate::db::{Component, FieldId, Port, Wire};

/// Which outline colour to stroke with. The painting surface decides the actual colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    Normal,
    Selected,
}

/// The painting surface the scene draws itself onto. Coordinates are world coordinates;
/// the surface owns the pan/zoom transform.
pub trait Canvas {
    fn set_stroke(&mut self, ink: Ink, width: f32);
    fn set_opacity(&mut self, opacity: f32);
    fn polyline(&mut self, points: &[Pos2]);
    fn text(&mut self, rect: Rect, align: Align2, text: &str);
}

/// Opacity levels and stroke width requested for the visual states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub ghost_opacity: f32,
    pub hover_opacity: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            ghost_opacity: 0.3,
            hover_opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub ghost: bool,
    pub hovered: bool,
    pub selected: bool,
    pub text_hovered: Option<FieldId>,
}

impl Emphasis {
    pub fn ghost() -> Self {
        Self {
            ghost: true,
            ..Default::default()
        }
    }

    /// A ghost is never drawn as hovered or selected.
    fn opacity(&self, style: &StrokeStyle) -> f32 {
        if self.ghost {
            style.ghost_opacity
        } else if self.hovered {
            style.hover_opacity
        } else {
            1.0
        }
    }

    fn ink(&self) -> Ink {
        if self.selected && !self.ghost {
            Ink::Selected
        } else {
            Ink::Normal
        }
    }

    fn apply(&self, canvas: &mut dyn Canvas, style: &StrokeStyle) -> f32 {
        let opacity = self.opacity(style);
        canvas.set_stroke(self.ink(), style.width);
        canvas.set_opacity(opacity);
        opacity
    }
}

pub trait Drawable {
    fn hit_test(&self, p: Pos2) -> bool;

    /// First text field under `p`, in declared order.
    fn hit_test_text(&self, p: Pos2) -> Option<FieldId>;

    /// Ports in world coordinates.
    fn ports(&self) -> Vec<Port>;

    fn draw(&self, canvas: &mut dyn Canvas, style: &StrokeStyle, emphasis: Emphasis);
}

impl Drawable for Wire {
    fn hit_test(&self, p: Pos2) -> bool {
        self.hit_box().contains(p)
    }

    fn hit_test_text(&self, _p: Pos2) -> Option<FieldId> {
        None
    }

    fn ports(&self) -> Vec<Port> {
        Self::ports(self).to_vec()
    }

    fn draw(&self, canvas: &mut dyn Canvas, style: &StrokeStyle, emphasis: Emphasis) {
        emphasis.apply(canvas, style);
        canvas.polyline(&[self.start.to_pos2(), self.end.to_pos2()]);
    }
}

impl Drawable for Component {
    fn hit_test(&self, p: Pos2) -> bool {
        self.contains(p)
    }

    fn hit_test_text(&self, p: Pos2) -> Option<FieldId> {
        self.text_fields()
            .iter()
            .find(|t| self.text_rect(t).contains(p))
            .map(|t| t.field)
    }

    fn ports(&self) -> Vec<Port> {
        Self::ports(self)
    }

    fn draw(&self, canvas: &mut dyn Canvas, style: &StrokeStyle, emphasis: Emphasis) {
        let opacity = emphasis.apply(canvas, style);

        for stroke in self.kind.graphics().strokes(self.rotation) {
            let points: Vec<Pos2> = stroke.iter().map(|&p| (self.pos + p).to_pos2()).collect();
            canvas.polyline(&points);
        }

        for field in self.text_fields() {
            let hovered = emphasis.text_hovered == Some(field.field);
            canvas.set_opacity(if hovered {
                opacity * style.hover_opacity
            } else {
                opacity
            });
            let text = self.label(field.field).unwrap_or_default();
            canvas.text(self.text_rect(field), field.align, &text);
        }
    }
}

/// Cross marking where a wire would start.
pub fn draw_wire_cursor(canvas: &mut dyn Canvas, style: &StrokeStyle, at: Pos2, half_size: f32) {
    canvas.set_stroke(Ink::Normal, style.width);
    canvas.set_opacity(style.hover_opacity);
    canvas.polyline(&[at - vec2(half_size, 0.0), at + vec2(half_size, 0.0)]);
    canvas.polyline(&[at - vec2(0.0, half_size), at + vec2(0.0, half_size)]);
}
