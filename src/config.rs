use crate::drawable::StrokeStyle;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid_size: i32,
    /// Fraction of the distance to the target the placement ghost still has to travel after
    /// one `ghost_decay_period_ms`.
    pub ghost_decay_base: f32,
    pub ghost_decay_period_ms: f32,
    /// Value shortcuts typed closer together than this extend the current value.
    pub typing_window_ms: f64,
    pub zoom_base: f32,
    pub wheel_points_per_notch: f32,
    pub stroke_width: f32,
    pub ghost_opacity: f32,
    pub hover_opacity: f32,
    pub wire_cursor_half_size: f32,
    pub repaint_interval_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            ghost_decay_base: 0.1,
            ghost_decay_period_ms: 100.0,
            typing_window_ms: 500.0,
            zoom_base: 1.1,
            wheel_points_per_notch: 40.0,
            stroke_width: 2.0,
            ghost_opacity: 0.3,
            hover_opacity: 0.5,
            wire_cursor_half_size: 8.0,
            repaint_interval_ms: 16,
        }
    }
}

impl EditorConfig {
    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.stroke_width,
            ghost_opacity: self.ghost_opacity,
            hover_opacity: self.hover_opacity,
        }
    }

    /// Share of the remaining distance the ghost covers in `dt_ms`. Independent of how the
    /// elapsed time is split into ticks.
    pub fn ghost_step(&self, dt_ms: f32) -> f32 {
        1.0 - self.ghost_decay_base.powf(dt_ms / self.ghost_decay_period_ms)
    }

    pub fn zoom_for(&self, exponent: f32) -> f32 {
        self.zoom_base.powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghost_step_is_frame_rate_independent() {
        let config = EditorConfig::default();
        // Remaining distance after 100ms in one tick vs ten ticks of 10ms.
        let one = 1.0 - config.ghost_step(100.0);
        let many = (0..10).fold(1.0, |remaining, _| remaining * (1.0 - config.ghost_step(10.0)));
        assert!((one - 0.1).abs() < 1e-6);
        assert!((one - many).abs() < 1e-5);
        assert_eq!(config.ghost_step(0.0), 0.0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{ "grid_size": 10 }"#).expect("partial config parses");
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.zoom_base, EditorConfig::default().zoom_base);
    }
}
