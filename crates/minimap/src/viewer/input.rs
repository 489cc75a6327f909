use winit::event::{ElementState, KeyEvent, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Edge-triggered key state for the viewer. Holding a key never repeats.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    pub(crate) quit_requested: bool,
    title_toggle_is_down: bool,
    title_toggle_pressed_edge: bool,
    zoom_in_key_is_down: bool,
    zoom_out_key_is_down: bool,
    pending_zoom_steps: i32,
}

impl InputCollector {
    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        match key {
            PhysicalKey::Code(KeyCode::Escape) => {
                if state == ElementState::Pressed {
                    self.mark_quit_requested();
                }
            }
            PhysicalKey::Code(KeyCode::F3) => {
                if press_edge(state, &mut self.title_toggle_is_down) {
                    self.title_toggle_pressed_edge = true;
                }
            }
            PhysicalKey::Code(KeyCode::Equal) | PhysicalKey::Code(KeyCode::NumpadAdd) => {
                if press_edge(state, &mut self.zoom_in_key_is_down) {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
            }
            PhysicalKey::Code(KeyCode::Minus) | PhysicalKey::Code(KeyCode::NumpadSubtract) => {
                if press_edge(state, &mut self.zoom_out_key_is_down) {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = zoom_steps_from_scroll_delta(delta);
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    pub(crate) fn take_zoom_steps(&mut self) -> i32 {
        std::mem::take(&mut self.pending_zoom_steps)
    }

    pub(crate) fn take_title_toggle_pressed(&mut self) -> bool {
        std::mem::take(&mut self.title_toggle_pressed_edge)
    }
}

/// Tracks a key's held state; true only on the press that starts a hold.
fn press_edge(state: ElementState, is_down: &mut bool) -> bool {
    match state {
        ElementState::Pressed => {
            let edge = !*is_down;
            *is_down = true;
            edge
        }
        ElementState::Released => {
            *is_down = false;
            false
        }
    }
}

fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(input: &mut InputCollector, code: KeyCode, state: ElementState) {
        input.handle_physical_key(PhysicalKey::Code(code), state);
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        key(&mut input, KeyCode::Escape, ElementState::Pressed);
        assert!(input.quit_requested);
    }

    #[test]
    fn zoom_keys_are_edge_triggered_only() {
        let mut input = InputCollector::default();

        key(&mut input, KeyCode::Equal, ElementState::Pressed);
        assert_eq!(input.take_zoom_steps(), 1);

        key(&mut input, KeyCode::Equal, ElementState::Pressed);
        assert_eq!(input.take_zoom_steps(), 0);

        key(&mut input, KeyCode::Equal, ElementState::Released);
        key(&mut input, KeyCode::NumpadAdd, ElementState::Pressed);
        assert_eq!(input.take_zoom_steps(), 1);

        key(&mut input, KeyCode::Minus, ElementState::Pressed);
        assert_eq!(input.take_zoom_steps(), -1);
    }

    #[test]
    fn f3_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();

        key(&mut input, KeyCode::F3, ElementState::Pressed);
        assert!(input.take_title_toggle_pressed());

        key(&mut input, KeyCode::F3, ElementState::Pressed);
        assert!(!input.take_title_toggle_pressed());

        key(&mut input, KeyCode::F3, ElementState::Released);
        key(&mut input, KeyCode::F3, ElementState::Pressed);
        assert!(input.take_title_toggle_pressed());
    }

    #[test]
    fn mouse_wheel_adds_zoom_steps_and_take_resets() {
        let mut input = InputCollector::default();
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -2.0));

        assert_eq!(input.take_zoom_steps(), -1);
        assert_eq!(input.take_zoom_steps(), 0);
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_step_direction() {
        let positive = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 3.0),
        ));
        let negative = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, -5.0),
        ));
        assert_eq!(positive, 1);
        assert_eq!(negative, -1);
    }
}
