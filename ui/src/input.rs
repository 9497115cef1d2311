use backend::Direction;
use eframe::egui::Key;

pub(crate) fn direction_for_key(key: Key) -> Option<Direction> {
    match key {
        Key::ArrowUp => Some(Direction::Up),
        Key::ArrowDown => Some(Direction::Down),
        Key::ArrowLeft => Some(Direction::Left),
        Key::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

/// A key event that matters to the turret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Press(Direction),
    Repeat(Direction),
    Release(Direction),
}

pub(crate) fn key_action(key: Key, pressed: bool, repeat: bool) -> Option<KeyAction> {
    let direction = direction_for_key(key)?;
    Some(match (pressed, repeat) {
        (true, false) => KeyAction::Press(direction),
        (true, true) => KeyAction::Repeat(direction),
        (false, _) => KeyAction::Release(direction),
    })
}
