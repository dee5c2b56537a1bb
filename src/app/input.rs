//! Keyboard bindings of the viewer.

use eframe::egui;

/// Something the user asked the pager to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    PageForward,
    PageBack,
    StepForward,
    ScaleUp,
    ScaleDown,
    ResetAutoscale,
    /// Re-read the page at the current cursor.
    Reload,
    /// Progress strip click, position in [0, 1].
    JumpTo(f64),
}

const BINDINGS: [(egui::Key, ViewerAction); 5] = [
    (egui::Key::ArrowRight, ViewerAction::PageForward),
    (egui::Key::ArrowLeft, ViewerAction::PageBack),
    (egui::Key::Space, ViewerAction::StepForward),
    (egui::Key::ArrowUp, ViewerAction::ScaleUp),
    (egui::Key::ArrowDown, ViewerAction::ScaleDown),
];

/// Actions for the keys pressed this frame, in binding order.
/// Presses with Ctrl, Alt or Command held are ignored.
pub fn actions_from_input(input: &egui::InputState) -> Vec<ViewerAction> {
    if input.modifiers.ctrl || input.modifiers.alt || input.modifiers.command {
        return Vec::new();
    }
    BINDINGS
        .iter()
        .filter(|(key, _)| input.key_pressed(*key))
        .map(|(_, action)| *action)
        .collect()
}
