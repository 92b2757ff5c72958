// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyboard dispatch table.
//!
//! Maps `(active tool, key event)` to an editor [`Command`]. The table is a
//! pure function; the [`Editor`](super::Editor) applies the command.

use super::viewport::{KEY_ZOOM_FACTOR, ROTATION_STEP_DEG};
use super::Tool;

/// Arrow-key pan distance before division by zoom.
pub const PAN_KEY_STEP: f64 = 40.0;

/// Keys the editor reacts to. Printable keys arrive as `Char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Delete,
    Backspace,
    Space,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
    pub shift: bool,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub command: bool,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            pressed: true,
            shift: false,
            command: false,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            pressed: false,
            ..Self::press(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_command(mut self) -> Self {
        self.command = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Pan by a step that the editor divides by the current zoom.
    Pan { dx: f64, dy: f64 },
    Zoom(f64),
    Rotate(f64),
    NextFrame,
    PrevFrame,
    SelectTool(Tool),
    DeleteSelection,
    HoldPan,
    ReleasePan,
    SaveNow,
}

pub fn command_for(tool: Tool, event: KeyEvent) -> Option<Command> {
    use Command::*;

    if !event.pressed {
        return match event.key {
            Key::Space => Some(ReleasePan),
            _ => None,
        };
    }

    if event.command {
        return match event.key {
            Key::Char(c) if c.eq_ignore_ascii_case(&'s') => Some(SaveNow),
            _ => None,
        };
    }

    match (tool, event.key) {
        (Tool::Pan, Key::Space) => None,
        (_, Key::Space) => Some(HoldPan),
        (_, Key::Escape) => Some(SelectTool(Tool::Select)),
        (_, Key::Delete | Key::Backspace) => Some(DeleteSelection),
        (_, Key::ArrowLeft) if event.shift => Some(PrevFrame),
        (_, Key::ArrowRight) if event.shift => Some(NextFrame),
        (_, Key::ArrowLeft) => Some(Pan { dx: -PAN_KEY_STEP, dy: 0.0 }),
        (_, Key::ArrowRight) => Some(Pan { dx: PAN_KEY_STEP, dy: 0.0 }),
        (_, Key::ArrowUp) => Some(Pan { dx: 0.0, dy: -PAN_KEY_STEP }),
        (_, Key::ArrowDown) => Some(Pan { dx: 0.0, dy: PAN_KEY_STEP }),
        (_, Key::Char(c)) => match c.to_ascii_lowercase() {
            '+' | '=' => Some(Zoom(KEY_ZOOM_FACTOR)),
            '-' | '_' => Some(Zoom(1.0 / KEY_ZOOM_FACTOR)),
            '[' => Some(Rotate(-ROTATION_STEP_DEG)),
            ']' => Some(Rotate(ROTATION_STEP_DEG)),
            'n' | 'd' => Some(NextFrame),
            'p' | 'a' => Some(PrevFrame),
            '1' => Some(SelectTool(Tool::BoatPoint)),
            '2' => Some(SelectTool(Tool::BoatBox)),
            '3' => Some(SelectTool(Tool::BuoyPoint)),
            '4' => Some(SelectTool(Tool::BuoyBox)),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_keys() {
        let expected = [
            ('1', Tool::BoatPoint),
            ('2', Tool::BoatBox),
            ('3', Tool::BuoyPoint),
            ('4', Tool::BuoyBox),
        ];
        for (c, tool) in expected {
            assert_eq!(
                command_for(Tool::Select, KeyEvent::press(Key::Char(c))),
                Some(Command::SelectTool(tool))
            );
        }
        assert_eq!(
            command_for(Tool::BoatBox, KeyEvent::press(Key::Escape)),
            Some(Command::SelectTool(Tool::Select))
        );
    }

    #[test]
    fn test_navigation_keys() {
        for c in ['n', 'd', 'N'] {
            assert_eq!(command_for(Tool::Select, KeyEvent::press(Key::Char(c))), Some(Command::NextFrame));
        }
        for c in ['p', 'a'] {
            assert_eq!(command_for(Tool::Select, KeyEvent::press(Key::Char(c))), Some(Command::PrevFrame));
        }
        assert_eq!(
            command_for(Tool::Select, KeyEvent::press(Key::ArrowRight).with_shift()),
            Some(Command::NextFrame)
        );
        assert_eq!(
            command_for(Tool::Select, KeyEvent::press(Key::ArrowLeft)),
            Some(Command::Pan { dx: -PAN_KEY_STEP, dy: 0.0 })
        );
    }

    #[test]
    fn test_pan_hold_and_release() {
        assert_eq!(command_for(Tool::BoatPoint, KeyEvent::press(Key::Space)), Some(Command::HoldPan));
        assert_eq!(command_for(Tool::Pan, KeyEvent::press(Key::Space)), None);
        assert_eq!(command_for(Tool::Pan, KeyEvent::release(Key::Space)), Some(Command::ReleasePan));
        assert_eq!(command_for(Tool::Select, KeyEvent::release(Key::Char('n'))), None);
    }

    #[test]
    fn test_save_combo() {
        assert_eq!(
            command_for(Tool::Select, KeyEvent::press(Key::Char('s')).with_command()),
            Some(Command::SaveNow)
        );
        // Command shortcuts don't fall through to plain bindings.
        assert_eq!(command_for(Tool::Select, KeyEvent::press(Key::Char('a')).with_command()), None);
        assert_eq!(command_for(Tool::Select, KeyEvent::press(Key::Char('s'))), None);
    }
}
