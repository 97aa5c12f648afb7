use std::fmt::Write as _;
use std::time::Duration;

use egui::emath::TSTransform;
use egui::{
    Align, Align2, Color32, Event, FontId, Key, Layout, Painter, PointerButton, Pos2, Rect,
    Response, Sense, Shape, Stroke, Ui, pos2, vec2,
};

use crate::config::EditorConfig;
use crate::db::ComponentKind;
use crate::drawable::{Canvas, Ink};
use crate::editor::{Editor, Mode};

// Grid
pub const COLOR_GRID_LIGHT: Color32 = Color32::from_rgb(230, 230, 230);
pub const COLOR_GRID_DARK: Color32 = Color32::from_rgb(40, 40, 40);
/// Below this many points between lines the grid is not drawn.
pub const MIN_GRID_SPACING: f32 = 4.0;

pub const COLOR_INK_LIGHT: Color32 = Color32::BLACK;
pub const COLOR_INK_DARK: Color32 = Color32::LIGHT_GRAY;
pub const COLOR_SELECTION: Color32 = Color32::LIGHT_BLUE;

pub const LABEL_TEXT_SIZE: f32 = 12.0;
pub const STATUS_TEXT_SIZE: f32 = 14.0;
pub const STATUS_MARGIN: f32 = 10.0;
pub const DEBUG_PANEL_WIDTH: f32 = 320.0;

/// Paints world geometry through the view transform.
pub struct EguiCanvas<'a> {
    painter: &'a Painter,
    transform: TSTransform,
    dark_mode: bool,
    color: Color32,
    width: f32,
    opacity: f32,
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a Painter, transform: TSTransform, dark_mode: bool) -> Self {
        Self {
            painter,
            transform,
            dark_mode,
            color: ink_color(Ink::Normal, dark_mode),
            width: 1.0,
            opacity: 1.0,
        }
    }

    fn faded(&self) -> Color32 {
        self.color.gamma_multiply(self.opacity)
    }
}

fn ink_color(ink: Ink, dark_mode: bool) -> Color32 {
    match ink {
        Ink::Normal if dark_mode => COLOR_INK_DARK,
        Ink::Normal => COLOR_INK_LIGHT,
        Ink::Selected => COLOR_SELECTION,
    }
}

impl Canvas for EguiCanvas<'_> {
    fn set_stroke(&mut self, ink: Ink, width: f32) {
        self.color = ink_color(ink, self.dark_mode);
        self.width = width;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn polyline(&mut self, points: &[Pos2]) {
        let points: Vec<Pos2> = points.iter().map(|&p| self.transform * p).collect();
        let stroke = Stroke::new(self.width * self.transform.scaling, self.faded());
        self.painter.add(Shape::line(points, stroke));
    }

    fn text(&mut self, rect: Rect, align: Align2, text: &str) {
        let rect = self.transform * rect;
        self.painter.text(
            align.pos_in_rect(&rect),
            align,
            text,
            FontId::proportional(LABEL_TEXT_SIZE * self.transform.scaling),
            self.faded(),
        );
    }
}

pub struct App {
    pub editor: Editor,
    pub show_debug: bool,
    pub show_logs: bool,
    // Value prompt state
    pub prompt_open: bool,
    pub prompt_buffer: String,
}

impl Default for App {
    fn default() -> Self {
        Self::with_config(EditorConfig::default())
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.editor.config);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                let is_web = cfg!(target_arch = "wasm32");

                if !is_web {
                    ui.menu_button("File", |ui| {
                        if ui.button("Quit").clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                    ui.add_space(16.0);
                }

                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_debug, "World Debug");
                    ui.checkbox(&mut self.show_logs, "Debug logs");
                });
                ui.add_space(16.0);

                ui.menu_button("Tools", |ui| {
                    if ui.button("Resistor").clicked() {
                        self.editor.select_kind(ComponentKind::resistor());
                    }
                    if ui.button("Capacitor").clicked() {
                        self.editor.select_kind(ComponentKind::capacitor());
                    }
                    if ui.button("Voltage source").clicked() {
                        self.editor.select_kind(ComponentKind::voltage_source());
                    }
                    if ui.button("Ground").clicked() {
                        self.editor.select_kind(ComponentKind::Ground);
                    }
                    ui.separator();
                    if ui.button("Wire").clicked() {
                        self.editor.set_mode(Mode::Wire);
                    }
                    if ui.button("Edit").clicked() {
                        self.editor.set_mode(Mode::Edit);
                    }
                });
                ui.add_space(16.0);

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    egui::widgets::global_theme_preference_buttons(ui);

                    ui.add_space(16.0);
                });
            });
        });

        let dt = ctx.input(|i| i.stable_dt);
        self.editor.tick(dt * 1000.0);
        ctx.request_repaint_after(Duration::from_millis(
            self.editor.config.repaint_interval_ms,
        ));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_main(ui);
        });
    }
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self::with_config(config)
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            editor: Editor::new(config),
            show_debug: false,
            show_logs: false,
            prompt_open: false,
            prompt_buffer: String::new(),
        }
    }

    pub fn draw_main(&mut self, ui: &mut Ui) {
        if self.show_logs {
            egui::Window::new("Debug logs").show(ui.ctx(), |ui| {
                egui_logger::logger_ui().show(ui);
            });
        }

        ui.with_layout(Layout::left_to_right(Align::Min), |ui| {
            if self.show_debug {
                let full_h = ui.available_height();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let mut dbg = self.debug_string();
                    ui.add_sized(
                        vec2(DEBUG_PANEL_WIDTH, full_h),
                        egui::TextEdit::multiline(&mut dbg),
                    );
                });
                ui.separator();
            }

            ui.vertical(|ui| {
                ui.label("shift+R/C/V/G place, R rotate, shift+W wire, esc back out");
                ui.label("backspace/x delete selection, shift+drag to pan, wheel to zoom");
                self.draw_canvas(ui);
            });
        });

        // After the canvas, so the key that closes the prompt is not seen by the editor.
        self.draw_value_prompt(ui.ctx());
    }

    fn draw_canvas(&mut self, ui: &mut Ui) {
        let (resp, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas_rect = resp.rect;
        let dark_mode = ui.visuals().dark_mode;

        self.editor.set_viewport(canvas_rect);
        self.handle_input(ui, &resp);

        let transform = self.editor.view_transform();
        Self::draw_grid(
            &painter,
            dark_mode,
            canvas_rect,
            transform,
            self.editor.config.grid_size,
        );

        let mut canvas = EguiCanvas::new(&painter, transform, dark_mode);
        self.editor.draw(&mut canvas);

        painter.text(
            canvas_rect.left_top() + vec2(STATUS_MARGIN, STATUS_MARGIN),
            Align2::LEFT_TOP,
            self.editor.status_text(),
            FontId::monospace(STATUS_TEXT_SIZE),
            ui.visuals().text_color(),
        );
    }

    fn handle_input(&mut self, ui: &Ui, resp: &Response) {
        let events = ui.input(|i| i.events.clone());
        let keyboard = !ui.ctx().wants_keyboard_input();
        let over_canvas = resp.contains_pointer();

        for event in events {
            match event {
                Event::PointerMoved(pos) => self.editor.pointer_moved(pos),
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: true,
                    modifiers,
                } if over_canvas => self.editor.pointer_pressed(pos, modifiers),
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } => self.editor.pointer_released(pos),
                Event::Key {
                    key,
                    pressed: true,
                    repeat,
                    modifiers,
                    ..
                } if keyboard => self.editor.key_pressed(key, modifiers, repeat),
                Event::Text(text) if keyboard => {
                    for c in text.chars() {
                        self.editor.text_typed(c);
                    }
                }
                _ => {}
            }
        }

        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0
            && over_canvas
            && let Some(pos) = ui.ctx().pointer_hover_pos()
        {
            let notches = scroll / self.editor.config.wheel_points_per_notch;
            self.editor.zoom_by(notches, pos);
        }
    }

    fn draw_grid(
        painter: &Painter,
        dark_mode: bool,
        canvas_rect: Rect,
        transform: TSTransform,
        grid_size: i32,
    ) {
        let grid_color = if dark_mode {
            COLOR_GRID_DARK
        } else {
            COLOR_GRID_LIGHT
        };
        let step = grid_size as f32 * transform.scaling;
        if step < MIN_GRID_SPACING {
            return;
        }
        // Screen position of the world origin; every grid line is a whole step from it.
        let origin = transform * Pos2::ZERO;

        // Draw vertical lines
        let mut x = canvas_rect.left() + (origin.x - canvas_rect.left()).rem_euclid(step);
        while x <= canvas_rect.right() {
            painter.line_segment(
                [pos2(x, canvas_rect.top()), pos2(x, canvas_rect.bottom())],
                Stroke::new(1.0, grid_color),
            );
            x += step;
        }

        // Draw horizontal lines
        let mut y = canvas_rect.top() + (origin.y - canvas_rect.top()).rem_euclid(step);
        while y <= canvas_rect.bottom() {
            painter.line_segment(
                [pos2(canvas_rect.left(), y), pos2(canvas_rect.right(), y)],
                Stroke::new(1.0, grid_color),
            );
            y += step;
        }
    }

    fn draw_value_prompt(&mut self, ctx: &egui::Context) {
        let Some(edit) = self.editor.pending_edit().cloned() else {
            self.prompt_open = false;
            return;
        };
        if !self.prompt_open {
            self.prompt_open = true;
            self.prompt_buffer = self
                .editor
                .scene()
                .get_item(&edit.item)
                .and_then(|item| item.kind.field(edit.field))
                .unwrap_or_default()
                .to_owned();
        }

        // Some(None) is a cancel, Some(Some(value)) an accepted value.
        let mut answer: Option<Option<String>> = None;
        egui::Window::new("Edit Value")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.label(format!("Enter the new {} of {}:", edit.field, edit.item));
                    let response = ui.text_edit_singleline(&mut self.prompt_buffer);
                    response.request_focus();

                    if ui.input(|i| i.key_pressed(Key::Enter)) {
                        answer = Some(Some(std::mem::take(&mut self.prompt_buffer)));
                    }
                    if ui.input(|i| i.key_pressed(Key::Escape)) {
                        answer = Some(None);
                    }

                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() {
                            answer = Some(Some(std::mem::take(&mut self.prompt_buffer)));
                        }
                        if ui.button("Cancel").clicked() {
                            answer = Some(None);
                        }
                    });
                });
            });

        if let Some(value) = answer {
            self.editor.resolve_edit(value);
            self.prompt_buffer.clear();
            self.prompt_open = false;
        }
    }

    fn debug_string(&self) -> String {
        let e = &self.editor;
        let mut out = String::new();
        writeln!(out, "mode: {}", e.mode()).ok();
        writeln!(out, "cursor: {:?}", e.cursor()).ok();
        writeln!(out, "grid: {}", e.grid()).ok();
        writeln!(out, "ghost: {:?}", e.ghost_pos()).ok();
        writeln!(out, "hovered: {:?}", e.hovered()).ok();
        writeln!(out, "selection: {:?}", e.selection()).ok();
        writeln!(
            out,
            "placement: {} facing {}",
            e.placement().kind.graphics().name,
            e.placement().rotation
        )
        .ok();
        writeln!(out, "pending edit: {:?}", e.pending_edit()).ok();
        writeln!(out, "pan: {:?} zoom: {:.3}", e.pan(), e.zoom()).ok();
        writeln!(out, "clock: {:.0}ms", e.clock_ms()).ok();

        writeln!(out, "\n--- Wire drag ---").ok();
        match e.wire_start() {
            Some(start) => {
                writeln!(out, "from {start}").ok();
                for wire in e.ghost_wires() {
                    writeln!(out, "  {}", wire.display()).ok();
                }
            }
            None => {
                writeln!(out, "none").ok();
            }
        }

        writeln!(out, "\n").ok();
        out.write_str(&e.scene().display()).ok();

        writeln!(out, "\n=== JSON ===").ok();
        match serde_json::to_string_pretty(e.scene()) {
            Ok(json) => {
                out.write_str(&json).ok();
            }
            Err(err) => {
                log::error!("Failed to serialize scene: {err}");
            }
        }

        out
    }
}
