use std::fmt::Display;

use egui::emath::TSTransform;
use egui::{Key, Modifiers, Pos2, Rect, Vec2};

use crate::config::EditorConfig;
use crate::db::{Component, ComponentKind, FieldId, Schematic, Wire};
use crate::drawable::{Canvas, Drawable as _, Emphasis, draw_wire_cursor};
use crate::geometry::{Direction, Point, snap_to_grid};
use crate::router;

/// Characters that set the pending component's value while placing.
pub const VALUE_SHORTCUTS: &str = "0123456789numkMG";

#[derive(serde::Deserialize, serde::Serialize, Copy, Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Place,
    Edit,
    Wire,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Place => f.write_str("place"),
            Self::Edit => f.write_str("edit"),
            Self::Wire => f.write_str("wire"),
        }
    }
}

/// What the pointer is over. Text fields win over whole entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hover {
    Field { item: String, field: FieldId },
    /// An item or a wire.
    Entity(String),
}

impl Display for Hover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field { item, field } => write!(f, "{item}:{field}"),
            Self::Entity(id) => f.write_str(id),
        }
    }
}

/// The component the next click in place mode creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub kind: ComponentKind,
    pub rotation: Direction,
}

impl Placement {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            rotation: Direction::West,
        }
    }
}

/// A field edit waiting on the host's text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub item: String,
    pub field: FieldId,
}

/// Turns pointer, key and tick events into scene changes.
///
/// Positions handed in are screen positions; the editor owns the pan/zoom transform and
/// keeps the pointer's world and grid positions up to date. While a field edit is pending
/// every input is ignored until [`Editor::resolve_edit`] is called.
pub struct Editor {
    pub config: EditorConfig,
    scene: Schematic,
    mode: Mode,
    placement: Placement,

    screen_cursor: Pos2,
    cursor: Pos2,
    grid: Point,
    ghost_pos: Pos2,
    mouse_down: bool,
    panning: bool,

    clock_ms: f64,
    last_typing_ms: Option<f64>,

    hovered: Option<Hover>,
    selection: Option<String>,

    wire_start: Option<Point>,
    // Pointer changed cell since the drag began; releasing commits.
    moved_wire: bool,
    ghost_wires: Vec<Wire>,

    viewport: Rect,
    pan: Vec2,
    zoom_exponent: f32,
    zoom: f32,

    pending_edit: Option<PendingEdit>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            scene: Schematic::default(),
            mode: Mode::Place,
            placement: Placement::new(ComponentKind::resistor()),
            screen_cursor: Pos2::ZERO,
            cursor: Pos2::ZERO,
            grid: Point::ZERO,
            ghost_pos: Pos2::ZERO,
            mouse_down: false,
            panning: false,
            clock_ms: 0.0,
            last_typing_ms: None,
            hovered: None,
            selection: None,
            wire_start: None,
            moved_wire: false,
            ghost_wires: Vec::new(),
            viewport: Rect::ZERO,
            pan: Vec2::ZERO,
            zoom_exponent: 0.0,
            zoom: 1.0,
            pending_edit: None,
        }
    }

    pub fn scene(&self) -> &Schematic {
        &self.scene
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Pointer in world coordinates.
    pub fn cursor(&self) -> Pos2 {
        self.cursor
    }

    pub fn grid(&self) -> Point {
        self.grid
    }

    pub fn ghost_pos(&self) -> Pos2 {
        self.ghost_pos
    }

    pub fn hovered(&self) -> Option<&Hover> {
        self.hovered.as_ref()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn wire_start(&self) -> Option<Point> {
        self.wire_start
    }

    pub fn ghost_wires(&self) -> &[Wire] {
        &self.ghost_wires
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending_edit.as_ref()
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.update_cursor();
        }
    }

    pub fn world_from_screen(&self, screen: Pos2) -> Pos2 {
        ((screen - self.viewport.center()) / self.zoom + self.pan).to_pos2()
    }

    /// World to screen, for the painter.
    pub fn view_transform(&self) -> TSTransform {
        TSTransform::new(
            self.viewport.center().to_vec2() - self.pan * self.zoom,
            self.zoom,
        )
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.pending_edit.is_some() || self.mode == mode {
            return;
        }
        if self.mode == Mode::Wire {
            self.cancel_wire();
        }
        log::debug!("mode {} -> {mode}", self.mode);
        self.mode = mode;
    }

    /// Switch to place mode with a fresh component of `kind`, facing west.
    pub fn select_kind(&mut self, kind: ComponentKind) {
        if self.pending_edit.is_some() {
            return;
        }
        self.set_mode(Mode::Place);
        self.placement = Placement::new(kind);
    }

    pub fn pointer_moved(&mut self, screen: Pos2) {
        let delta = screen - self.screen_cursor;
        self.screen_cursor = screen;
        if self.panning {
            self.pan -= delta / self.zoom;
        }
        self.update_cursor();
    }

    pub fn pointer_pressed(&mut self, screen: Pos2, modifiers: Modifiers) {
        if self.pending_edit.is_some() {
            return;
        }
        self.pointer_moved(screen);

        let was_down = self.mouse_down;
        self.mouse_down = true;
        if modifiers.shift {
            self.panning = true;
            return;
        }
        if was_down {
            return;
        }

        match self.mode {
            Mode::Place => self.place_at_cursor(),
            Mode::Wire => match self.wire_start {
                None => {
                    log::debug!("wire drag from {}", self.grid);
                    self.wire_start = Some(self.grid);
                    self.moved_wire = false;
                }
                Some(_) => self.commit_wire(self.grid),
            },
            Mode::Edit => self.click_edit(),
        }
    }

    pub fn pointer_released(&mut self, screen: Pos2) {
        self.mouse_down = false;
        self.panning = false;
        if self.pending_edit.is_some() {
            return;
        }
        self.pointer_moved(screen);

        if self.mode == Mode::Wire && self.wire_start.is_some() && self.moved_wire {
            self.commit_wire(self.grid);
        }
    }

    /// Zoom by whole or fractional wheel notches. The pointer keeps its screen position, so
    /// its world and grid positions are recomputed.
    pub fn zoom_by(&mut self, notches: f32, screen: Pos2) {
        if self.pending_edit.is_some() || notches == 0.0 {
            return;
        }
        self.zoom_exponent += notches;
        self.zoom = self.config.zoom_for(self.zoom_exponent);
        self.screen_cursor = screen;
        self.update_cursor();
    }

    /// A key went down. `repeat` is set for auto-repeated presses, which are ignored.
    pub fn key_pressed(&mut self, key: Key, modifiers: Modifiers, repeat: bool) {
        if self.pending_edit.is_some() || repeat {
            return;
        }

        let shift = modifiers.shift;
        match key {
            Key::Escape => self.back_out(),
            Key::R if !shift => {
                self.placement.rotation = self.placement.rotation.next();
                log::debug!("placement faces {}", self.placement.rotation);
            }
            Key::W if shift => self.set_mode(Mode::Wire),
            Key::R => self.select_kind(ComponentKind::resistor()),
            Key::C if shift => self.select_kind(ComponentKind::capacitor()),
            Key::V if shift => self.select_kind(ComponentKind::voltage_source()),
            Key::G if shift => self.select_kind(ComponentKind::Ground),
            Key::Backspace | Key::X => self.delete_selection(),
            _ => {}
        }

        if key == Key::Backspace
            && self.mode == Mode::Place
            && let Some(field) = self.placement.kind.primary_field()
            && let Some(value) = self.placement.kind.field_mut(field)
        {
            value.clear();
        }
    }

    /// A printable character arrived. Only value shortcuts in place mode do anything.
    pub fn text_typed(&mut self, c: char) {
        if self.pending_edit.is_some() || self.mode != Mode::Place || !VALUE_SHORTCUTS.contains(c)
        {
            return;
        }
        let Some(field) = self.placement.kind.primary_field() else {
            return;
        };

        let extend = self
            .last_typing_ms
            .is_some_and(|at| self.clock_ms - at < self.config.typing_window_ms);
        if let Some(value) = self.placement.kind.field_mut(field) {
            if !extend {
                value.clear();
            }
            value.push(c);
        }
        self.last_typing_ms = Some(self.clock_ms);
    }

    /// Advance the animation clock. Moves the placement ghost toward the pointer's grid cell
    /// and, during a wire drag, reroutes the preview to the ghost.
    pub fn tick(&mut self, dt_ms: f32) {
        self.clock_ms += f64::from(dt_ms);

        let target = self.grid.to_pos2();
        self.ghost_pos += (target - self.ghost_pos) * self.config.ghost_step(dt_ms);

        if self.mode == Mode::Wire
            && let Some(start) = self.wire_start
        {
            let end = Point::from_pos2(self.ghost_pos);
            self.ghost_wires = router::route(start, end, &self.scene.ports());
        }
    }

    /// Apply the host prompt's answer to the pending field edit. `None` means cancelled.
    pub fn resolve_edit(&mut self, value: Option<String>) {
        let Some(edit) = self.pending_edit.take() else {
            return;
        };
        let Some(value) = value else {
            log::debug!("edit of {}:{} cancelled", edit.item, edit.field);
            return;
        };

        log::info!("{}:{} = {value:?}", edit.item, edit.field);
        if !self.scene.set_field(&edit.item, edit.field, value) {
            log::warn!("{} has no {} field", edit.item, edit.field);
        }
        self.refresh_hover();
    }

    /// Whether the translucent placement preview should be drawn this frame. It hides once it
    /// has settled on a cell that is already taken.
    pub fn show_placement_ghost(&self) -> bool {
        if self.mode != Mode::Place {
            return false;
        }
        let offset = self.ghost_pos - self.grid.to_pos2();
        let settled = offset.x.abs() + offset.y.abs() <= 2.0;
        !(settled && self.scene.is_occupied(self.grid))
    }

    pub fn placement_ghost(&self) -> Component {
        let kind = self.placement.kind.clone();
        Component::new(
            self.scene.next_item_id(kind.symbol()),
            Point::from_pos2(self.ghost_pos),
            self.placement.rotation,
            kind,
        )
    }

    pub fn status_text(&self) -> String {
        let hover = self
            .hovered
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        format!(
            "{}\n{:.0}, {:.0}\n{hover}",
            self.mode, self.cursor.x, self.cursor.y
        )
    }

    /// Draw previews, then wires, then components, in world coordinates.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let style = self.config.stroke_style();
        let half_size = self.config.wire_cursor_half_size;

        match self.mode {
            Mode::Place => {
                if self.show_placement_ghost() {
                    self.placement_ghost()
                        .draw(canvas, &style, Emphasis::ghost());
                }
            }
            Mode::Wire => {
                if self.wire_start.is_none() {
                    draw_wire_cursor(canvas, &style, self.grid.to_pos2(), half_size);
                }
                for wire in &self.ghost_wires {
                    wire.draw(canvas, &style, Emphasis::ghost());
                }
                draw_wire_cursor(canvas, &style, self.ghost_pos, half_size);
            }
            Mode::Edit => {}
        }

        for wire in &self.scene.wires {
            wire.draw(canvas, &style, self.emphasis_for(&wire.id));
        }
        for item in &self.scene.items {
            item.draw(canvas, &style, self.emphasis_for(&item.id));
        }
    }

    fn emphasis_for(&self, id: &str) -> Emphasis {
        let editing = self.mode == Mode::Edit;
        let (hovered, text_hovered) = match &self.hovered {
            Some(Hover::Entity(hovered)) if editing && hovered == id => (true, None),
            Some(Hover::Field { item, field }) if editing && item == id => (false, Some(*field)),
            _ => (false, None),
        };
        Emphasis {
            ghost: false,
            hovered,
            selected: self.selection.as_deref() == Some(id),
            text_hovered,
        }
    }

    fn update_cursor(&mut self) {
        self.cursor = self.world_from_screen(self.screen_cursor);
        let old_grid = self.grid;
        self.grid = snap_to_grid(self.cursor, self.config.grid_size);
        if old_grid != self.grid && self.mode == Mode::Wire && self.wire_start.is_some() {
            self.moved_wire = true;
        }
        self.refresh_hover();
    }

    fn refresh_hover(&mut self) {
        let hovered = self.hover_at(self.cursor);
        if hovered != self.hovered {
            log::debug!("hover {hovered:?}");
            self.hovered = hovered;
        }
    }

    fn hover_at(&self, p: Pos2) -> Option<Hover> {
        for item in &self.scene.items {
            if let Some(field) = item.hit_test_text(p) {
                return Some(Hover::Field {
                    item: item.id.clone(),
                    field,
                });
            }
        }
        let wire = self.scene.wires.iter().find(|w| w.hit_test(p));
        if let Some(wire) = wire {
            return Some(Hover::Entity(wire.id.clone()));
        }
        self.scene
            .items
            .iter()
            .find(|item| item.hit_test(p))
            .map(|item| Hover::Entity(item.id.clone()))
    }

    fn place_at_cursor(&mut self) {
        self.last_typing_ms = None;
        let at = self.grid;
        match self
            .scene
            .place(self.placement.kind.clone(), self.placement.rotation, at)
        {
            Some(item) => log::info!("placed {}", item.display()),
            None => log::debug!("{at} is occupied"),
        }
        self.refresh_hover();
    }

    fn click_edit(&mut self) {
        match self.hovered.clone() {
            Some(Hover::Field { item, field }) => {
                log::debug!("editing {item}:{field}");
                self.pending_edit = Some(PendingEdit { item, field });
            }
            Some(Hover::Entity(id)) => {
                log::debug!("selected {id}");
                self.selection = Some(id);
            }
            None => {}
        }
    }

    fn commit_wire(&mut self, end: Point) {
        let Some(start) = self.wire_start.take() else {
            return;
        };
        let segments = router::route(start, end, &self.scene.ports());
        let ids = self.scene.commit_wires(segments);
        if ids.is_empty() {
            log::debug!("wire from {start} to {end} is empty");
        } else {
            log::info!("wired {start} -> {end}: {}", ids.join(", "));
        }
        self.moved_wire = false;
        self.ghost_wires.clear();
        self.refresh_hover();
    }

    fn cancel_wire(&mut self) {
        if self.wire_start.take().is_some() {
            log::debug!("wire drag cancelled");
        }
        self.moved_wire = false;
        self.ghost_wires.clear();
    }

    /// Escape: drop the wire drag, else the selection, else go back to edit mode.
    fn back_out(&mut self) {
        if self.mode == Mode::Wire && self.wire_start.is_some() {
            self.cancel_wire();
        } else if let Some(id) = self.selection.take() {
            log::debug!("deselected {id}");
        } else {
            self.set_mode(Mode::Edit);
        }
    }

    fn delete_selection(&mut self) {
        let Some(id) = self.selection.take() else {
            return;
        };
        if self.scene.remove(&id) {
            log::info!("deleted {id}");
        }
        self.refresh_hover();
    }
}
