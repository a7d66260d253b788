//! Declarative key table for the text input.

use std::collections::HashMap;

use vellum_core::KeyCombo;

use super::buffer::Motion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditCommand {
    Move {
        motion: Motion,
        extend: bool,
    },
    Backspace,
    Delete,
    /// Plain Enter: hand the text to `on_submit`.
    Submit,
    /// Shift+Enter: split the line (single-line mode submits instead).
    Newline,
    SelectAll,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
    ReleaseFocus,
    /// Consumed without doing anything, so the host never sees it.
    Block,
}

/// Bare letters a host commonly binds as single-key tools.
const HOST_LETTERS: [&str; 16] = [
    "G", "R", "S", "E", "I", "P", "B", "L", "U", "H", "J", "K", "M", "Q", "W", "T",
];

#[derive(Clone, Debug)]
pub struct KeyMap {
    table: HashMap<KeyCombo, EditCommand>,
}

impl Default for KeyMap {
    fn default() -> Self {
        use EditCommand::*;
        use Motion as M;

        let mut map = KeyMap {
            table: HashMap::new(),
        };
        let mv = |motion, extend| Move { motion, extend };

        map.bind("BACK_SPACE", Backspace);
        map.bind("DEL", Delete);
        map.bind("RET", Submit);
        map.bind("SHIFT_RET", Newline);

        for (key, motion) in [
            ("LEFT_ARROW", M::Left),
            ("RIGHT_ARROW", M::Right),
            ("UP_ARROW", M::Up),
            ("DOWN_ARROW", M::Down),
            ("HOME", M::LineStart),
            ("END", M::LineEnd),
            ("PAGE_UP", M::PageUp),
            ("PAGE_DOWN", M::PageDown),
        ] {
            map.bind(key, mv(motion, false));
            map.bind(&format!("SHIFT_{key}"), mv(motion, true));
        }
        for (key, motion) in [
            ("LEFT_ARROW", M::WordLeft),
            ("RIGHT_ARROW", M::WordRight),
            ("HOME", M::DocStart),
            ("END", M::DocEnd),
        ] {
            map.bind(&format!("CTRL_{key}"), mv(motion, false));
            map.bind(&format!("CTRL_SHIFT_{key}"), mv(motion, true));
        }

        map.bind("CTRL_A", SelectAll);
        map.bind("CTRL_C", Copy);
        map.bind("CTRL_V", Paste);
        map.bind("CTRL_X", Cut);
        map.bind("CTRL_Z", Undo);
        map.bind("CTRL_Y", Redo);
        map.bind("CTRL_SHIFT_Z", Redo);
        map.bind("ESC", ReleaseFocus);

        for key in [
            "TAB",
            "SHIFT_TAB",
            "CTRL_S",
            "CTRL_O",
            "CTRL_N",
            "CTRL_UP_ARROW",
            "CTRL_DOWN_ARROW",
        ] {
            map.bind(key, Block);
        }
        for n in 1..=12 {
            map.bind(&format!("F{n}"), Block);
        }
        map
    }
}

impl KeyMap {
    /// An empty table; only host shortcuts are still swallowed.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Binds a combo written as e.g. `"CTRL_SHIFT_Z"`.
    pub fn bind(&mut self, combo: &str, command: EditCommand) {
        let Ok(combo) = combo.parse::<KeyCombo>();
        self.table.insert(combo, command);
    }

    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<EditCommand> {
        self.table.remove(combo)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The bound command, falling back to [`EditCommand::Block`] for host
    /// shortcut patterns.
    pub fn lookup(&self, combo: &KeyCombo) -> Option<EditCommand> {
        self.table
            .get(combo)
            .copied()
            .or_else(|| is_host_shortcut(combo).then_some(EditCommand::Block))
    }
}

/// Combos a host would otherwise act on while the user types: anything
/// with Alt, Ctrl or Shift plus a digit, and the bare tool letters.
pub fn is_host_shortcut(combo: &KeyCombo) -> bool {
    if combo.alt() {
        return true;
    }
    let ends_with_digit = combo.key.chars().last().is_some_and(|c| c.is_ascii_digit());
    if (combo.ctrl() || combo.shift()) && ends_with_digit {
        return true;
    }
    combo.modifiers.is_empty() && HOST_LETTERS.contains(&combo.key.as_str())
}
