//! Key and button input: chords, bindings, and the action surface.

use bitflags::bitflags;
use thiserror::Error;
use tracing::warn;

use crate::config::BindingConfig;
use crate::state::NUM_WORKSPACES;

/// Input parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid key: {0}")]
    Key(String),
    #[error("invalid binding: {0}")]
    Binding(String),
    #[error("invalid command: {0}")]
    Command(String),
}

bitflags! {
    /// Keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Modifiers {
    /// Parse a single modifier name; unknown names yield the empty mask.
    pub fn from_mod_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "shift" => Self::SHIFT,
            "ctrl" | "control" => Self::CTRL,
            "alt" | "mod1" => Self::ALT,
            "super" | "mod4" | "logo" | "win" => Self::SUPER,
            _ => Self::empty(),
        }
    }
}

/// A key symbol, independent of keyboard layout plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySym {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9, Key0,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Return, Space, Tab, Escape, Backspace, Delete,
    Left, Right, Up, Down,
    Minus, Equal, Comma, Period, Slash, Semicolon, Apostrophe,
    Grave, Backslash, BracketLeft, BracketRight,
}

impl KeySym {
    /// Parse a key name as written in config files.
    pub fn from_name(name: &str) -> Result<Self, InputError> {
        let key = match name.to_lowercase().as_str() {
            "a" => Self::A,
            "b" => Self::B,
            "c" => Self::C,
            "d" => Self::D,
            "e" => Self::E,
            "f" => Self::F,
            "g" => Self::G,
            "h" => Self::H,
            "i" => Self::I,
            "j" => Self::J,
            "k" => Self::K,
            "l" => Self::L,
            "m" => Self::M,
            "n" => Self::N,
            "o" => Self::O,
            "p" => Self::P,
            "q" => Self::Q,
            "r" => Self::R,
            "s" => Self::S,
            "t" => Self::T,
            "u" => Self::U,
            "v" => Self::V,
            "w" => Self::W,
            "x" => Self::X,
            "y" => Self::Y,
            "z" => Self::Z,
            "1" => Self::Key1,
            "2" => Self::Key2,
            "3" => Self::Key3,
            "4" => Self::Key4,
            "5" => Self::Key5,
            "6" => Self::Key6,
            "7" => Self::Key7,
            "8" => Self::Key8,
            "9" => Self::Key9,
            "0" => Self::Key0,
            "f1" => Self::F1,
            "f2" => Self::F2,
            "f3" => Self::F3,
            "f4" => Self::F4,
            "f5" => Self::F5,
            "f6" => Self::F6,
            "f7" => Self::F7,
            "f8" => Self::F8,
            "f9" => Self::F9,
            "f10" => Self::F10,
            "f11" => Self::F11,
            "f12" => Self::F12,
            "return" | "enter" => Self::Return,
            "space" => Self::Space,
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "minus" | "-" => Self::Minus,
            "equal" | "=" => Self::Equal,
            "comma" | "," => Self::Comma,
            "period" | "." => Self::Period,
            "slash" | "/" => Self::Slash,
            "semicolon" | ";" => Self::Semicolon,
            "apostrophe" | "'" => Self::Apostrophe,
            "grave" | "`" => Self::Grave,
            "backslash" | "\\" => Self::Backslash,
            "bracketleft" | "[" => Self::BracketLeft,
            "bracketright" | "]" => Self::BracketRight,
            _ => return Err(InputError::Key(name.to_string())),
        };
        Ok(key)
    }
}

/// Pointer buttons as the backend reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
}

/// A modifier-mask + key-symbol combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub key: KeySym,
}

impl Chord {
    pub const fn new(modifiers: Modifiers, key: KeySym) -> Self {
        Self { modifiers, key }
    }

    /// Parse a chord string like `Mod4+Shift+Return`.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let mut modifiers = Modifiers::empty();
        let mut key = None;

        for part in s.split('+') {
            let part = part.trim();
            let modifier = Modifiers::from_mod_name(part);
            if modifier.is_empty() {
                key = Some(KeySym::from_name(part)?);
            } else {
                modifiers.insert(modifier);
            }
        }

        match key {
            Some(key) => Ok(Self { modifiers, key }),
            None => Err(InputError::Binding(s.to_string())),
        }
    }
}

/// The zero-argument core actions reachable from bindings.
///
/// Every action is a defined no-op when nothing is focused and leaves the
/// data model valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CloseFocused,
    FocusNext,
    FocusPrev,
    MoveMasterNext,
    MoveMasterPrev,
    SetMaster,
    IncGaps,
    DecGaps,
    ResizeMasterAdd,
    ResizeMasterSub,
    ToggleFloating,
    ToggleFloatingGlobal,
    ToggleFullscreen,
    ReloadConfig,
    Quit,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "close_focused" | "close" => Self::CloseFocused,
            "focus_next" => Self::FocusNext,
            "focus_prev" => Self::FocusPrev,
            "move_master_next" => Self::MoveMasterNext,
            "move_master_prev" => Self::MoveMasterPrev,
            "set_master" | "master" => Self::SetMaster,
            "inc_gaps" => Self::IncGaps,
            "dec_gaps" => Self::DecGaps,
            "resize_master_add" => Self::ResizeMasterAdd,
            "resize_master_sub" => Self::ResizeMasterSub,
            "toggle_floating" => Self::ToggleFloating,
            "toggle_floating_global" => Self::ToggleFloatingGlobal,
            "toggle_fullscreen" => Self::ToggleFullscreen,
            "reload_config" | "reload" => Self::ReloadConfig,
            "quit" => Self::Quit,
            _ => return None,
        };
        Some(action)
    }
}

/// What a matched binding does. One payload shape per kind, dispatched by a
/// match over the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAction {
    /// Spawn an external command, fire-and-forget.
    Spawn(Vec<String>),
    /// Invoke a core action.
    Invoke(Action),
    /// Switch the event monitor's active workspace.
    ChangeWorkspace(usize),
    /// Move the focused client to a workspace on its monitor.
    MoveToWorkspace(usize),
}

impl BindingAction {
    /// Parse a command string from config.
    ///
    /// Forms: `exec <cmd...>`, `workspace <1-9>`, `send <1-9>`, or a core
    /// action name.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let s = s.trim();
        let (head, rest) = s.split_once(' ').unwrap_or((s, ""));

        match head {
            "exec" => {
                let argv: Vec<String> = rest.split_whitespace().map(String::from).collect();
                if argv.is_empty() {
                    Err(InputError::Command(s.to_string()))
                } else {
                    Ok(Self::Spawn(argv))
                }
            }
            "workspace" => parse_workspace_index(rest)
                .map(Self::ChangeWorkspace)
                .ok_or_else(|| InputError::Command(s.to_string())),
            "send" => parse_workspace_index(rest)
                .map(Self::MoveToWorkspace)
                .ok_or_else(|| InputError::Command(s.to_string())),
            name => Action::from_name(name)
                .map(Self::Invoke)
                .ok_or_else(|| InputError::Command(s.to_string())),
        }
    }
}

fn parse_workspace_index(s: &str) -> Option<usize> {
    let n: usize = s.trim().parse().ok()?;
    (1..=NUM_WORKSPACES).contains(&n).then(|| n - 1)
}

/// A compiled binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub chord: Chord,
    pub action: BindingAction,
}

/// The compiled binding table.
///
/// Static after compilation; a reload builds a fresh table and swaps it in
/// wholesale between events. Resolution is a linear scan so that the first
/// match in table order wins.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    table: Vec<Binding>,
}

impl Bindings {
    /// Compile the config binding list, skipping invalid entries with a
    /// warning. Config errors never block startup or reload.
    pub fn compile(configs: &[BindingConfig]) -> Self {
        let mut table = Vec::with_capacity(configs.len());
        for entry in configs {
            let chord = match Chord::parse(&entry.keys) {
                Ok(chord) => chord,
                Err(e) => {
                    warn!(keys = %entry.keys, "skipping binding: {e}");
                    continue;
                }
            };
            let action = match BindingAction::parse(&entry.command) {
                Ok(action) => action,
                Err(e) => {
                    warn!(command = %entry.command, "skipping binding: {e}");
                    continue;
                }
            };
            table.push(Binding { chord, action });
        }
        Self { table }
    }

    /// First binding matching the chord exactly, in table order. No match is
    /// a no-op, not an error.
    pub fn resolve(&self, modifiers: Modifiers, key: KeySym) -> Option<&BindingAction> {
        self.table
            .iter()
            .find(|b| b.chord.modifiers == modifiers && b.chord.key == key)
            .map(|b| &b.action)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chord_parse() {
        let chord = Chord::parse("Mod4+Return").unwrap();
        assert!(chord.modifiers.contains(Modifiers::SUPER));
        assert_eq!(chord.key, KeySym::Return);

        let chord = Chord::parse("Mod4+Shift+q").unwrap();
        assert_eq!(chord.modifiers, Modifiers::SUPER | Modifiers::SHIFT);
        assert_eq!(chord.key, KeySym::Q);

        assert!(Chord::parse("Mod4+Shift").is_err());
        assert!(Chord::parse("Mod4+banana").is_err());
    }

    #[test]
    fn command_parse() {
        assert_eq!(
            BindingAction::parse("exec alacritty -e htop"),
            Ok(BindingAction::Spawn(vec![
                "alacritty".into(),
                "-e".into(),
                "htop".into()
            ]))
        );
        assert_eq!(
            BindingAction::parse("workspace 3"),
            Ok(BindingAction::ChangeWorkspace(2))
        );
        assert_eq!(
            BindingAction::parse("send 9"),
            Ok(BindingAction::MoveToWorkspace(8))
        );
        assert_eq!(
            BindingAction::parse("toggle_fullscreen"),
            Ok(BindingAction::Invoke(Action::ToggleFullscreen))
        );
        assert!(BindingAction::parse("workspace 10").is_err());
        assert!(BindingAction::parse("frobnicate").is_err());
    }

    #[test]
    fn first_match_in_table_order_wins() {
        let configs = vec![
            BindingConfig {
                keys: "Mod4+x".into(),
                command: "workspace 1".into(),
            },
            BindingConfig {
                keys: "Mod4+x".into(),
                command: "workspace 2".into(),
            },
        ];
        let bindings = Bindings::compile(&configs);
        assert_eq!(bindings.len(), 2);
        assert_eq!(
            bindings.resolve(Modifiers::SUPER, KeySym::X),
            Some(&BindingAction::ChangeWorkspace(0))
        );
    }

    #[test]
    fn invalid_entries_are_skipped_not_fatal() {
        let configs = vec![
            BindingConfig {
                keys: "Mod4+nosuchkey".into(),
                command: "quit".into(),
            },
            BindingConfig {
                keys: "Mod4+q".into(),
                command: "close_focused".into(),
            },
        ];
        let bindings = Bindings::compile(&configs);
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings.resolve(Modifiers::SUPER, KeySym::Q),
            Some(&BindingAction::Invoke(Action::CloseFocused))
        );
    }

    #[test]
    fn unbound_chord_is_a_noop() {
        let bindings = Bindings::compile(&[]);
        assert_eq!(bindings.resolve(Modifiers::SUPER, KeySym::Z), None);
    }
}
