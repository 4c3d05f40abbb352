//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only the main table view goes through the keymap. Search input and modal
//! dialogs use fixed keys (typing, Tab, Enter, Esc).

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::config::parse_kv_lines;

/// Semantic actions available from the main view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the search prompt.
    StartSearch,
    /// Open the filter and sort dialog.
    OpenFilterMenu,
    /// Open the create-user form.
    NewUser,
    /// Open the edit form for the selected row.
    EditSelection,
    /// Ask to delete the selected row.
    DeleteSelection,
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    FirstPage,
    LastPage,
    /// Sort by the next column.
    CycleSortField,
    /// Flip between ascending and descending.
    ToggleSortOrder,
    /// Step through 10 / 25 / 50 / 100 rows per page.
    CyclePageSize,
    /// Drop the search term and every field filter.
    ClearFilters,
    /// Fetch the user list again.
    Reload,
    OpenHelp,
    ToggleKeybindsPane,
    /// Swallow the key.
    Ignore,
}

impl KeyAction {
    pub const ALL: [KeyAction; 20] = [
        KeyAction::Quit,
        KeyAction::StartSearch,
        KeyAction::OpenFilterMenu,
        KeyAction::NewUser,
        KeyAction::EditSelection,
        KeyAction::DeleteSelection,
        KeyAction::MoveUp,
        KeyAction::MoveDown,
        KeyAction::PrevPage,
        KeyAction::NextPage,
        KeyAction::FirstPage,
        KeyAction::LastPage,
        KeyAction::CycleSortField,
        KeyAction::ToggleSortOrder,
        KeyAction::CyclePageSize,
        KeyAction::ClearFilters,
        KeyAction::Reload,
        KeyAction::OpenHelp,
        KeyAction::ToggleKeybindsPane,
        KeyAction::Ignore,
    ];

    /// Name used on the left side of `keybinds.conf`.
    pub fn name(self) -> &'static str {
        match self {
            KeyAction::Quit => "Quit",
            KeyAction::StartSearch => "StartSearch",
            KeyAction::OpenFilterMenu => "OpenFilterMenu",
            KeyAction::NewUser => "NewUser",
            KeyAction::EditSelection => "EditSelection",
            KeyAction::DeleteSelection => "DeleteSelection",
            KeyAction::MoveUp => "MoveUp",
            KeyAction::MoveDown => "MoveDown",
            KeyAction::PrevPage => "PrevPage",
            KeyAction::NextPage => "NextPage",
            KeyAction::FirstPage => "FirstPage",
            KeyAction::LastPage => "LastPage",
            KeyAction::CycleSortField => "CycleSortField",
            KeyAction::ToggleSortOrder => "ToggleSortOrder",
            KeyAction::CyclePageSize => "CyclePageSize",
            KeyAction::ClearFilters => "ClearFilters",
            KeyAction::Reload => "Reload",
            KeyAction::OpenHelp => "OpenHelp",
            KeyAction::ToggleKeybindsPane => "ToggleKeybindsPane",
            KeyAction::Ignore => "Ignore",
        }
    }

    /// Label used in the keybindings panel.
    pub fn label(self) -> &'static str {
        match self {
            KeyAction::Quit => "Quit",
            KeyAction::StartSearch => "Search",
            KeyAction::OpenFilterMenu => "Filter / sort",
            KeyAction::NewUser => "New user",
            KeyAction::EditSelection => "Edit user",
            KeyAction::DeleteSelection => "Delete user",
            KeyAction::MoveUp => "Move up",
            KeyAction::MoveDown => "Move down",
            KeyAction::PrevPage => "Previous page",
            KeyAction::NextPage => "Next page",
            KeyAction::FirstPage => "First page",
            KeyAction::LastPage => "Last page",
            KeyAction::CycleSortField => "Sort column",
            KeyAction::ToggleSortOrder => "Sort order",
            KeyAction::CyclePageSize => "Rows per page",
            KeyAction::ClearFilters => "Clear search/filters",
            KeyAction::Reload => "Reload",
            KeyAction::OpenHelp => "Help",
            KeyAction::ToggleKeybindsPane => "Keybindings panel",
            KeyAction::Ignore => "Ignore",
        }
    }

    /// Inverse of [`KeyAction::name`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == s.trim())
    }
}

/// Mapping from key presses to actions.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Arrow keys plus vim-style hjkl, single letters for the rest.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        let mut bind = |code: KeyCode, action: KeyAction| {
            bindings.insert((M::NONE, code), action);
        };
        bind(Char('q'), KeyAction::Quit);
        bind(Esc, KeyAction::Ignore);
        bind(Char('/'), KeyAction::StartSearch);
        bind(Char('f'), KeyAction::OpenFilterMenu);
        bind(Char('n'), KeyAction::NewUser);
        bind(Enter, KeyAction::EditSelection);
        bind(Char('e'), KeyAction::EditSelection);
        bind(Delete, KeyAction::DeleteSelection);
        bind(Char('d'), KeyAction::DeleteSelection);
        bind(Up, KeyAction::MoveUp);
        bind(Down, KeyAction::MoveDown);
        bind(Char('k'), KeyAction::MoveUp);
        bind(Char('j'), KeyAction::MoveDown);
        bind(Left, KeyAction::PrevPage);
        bind(Right, KeyAction::NextPage);
        bind(Char('h'), KeyAction::PrevPage);
        bind(Char('l'), KeyAction::NextPage);
        bind(PageUp, KeyAction::PrevPage);
        bind(PageDown, KeyAction::NextPage);
        bind(Home, KeyAction::FirstPage);
        bind(End, KeyAction::LastPage);
        bind(Char('s'), KeyAction::CycleSortField);
        bind(Char('o'), KeyAction::ToggleSortOrder);
        bind(Char('p'), KeyAction::CyclePageSize);
        bind(Char('c'), KeyAction::ClearFilters);
        bind(Char('r'), KeyAction::Reload);
        bind(Char('?'), KeyAction::OpenHelp);
        bind(Char('K'), KeyAction::ToggleKeybindsPane);
        // terminals disagree on whether Shift is reported with uppercase letters
        bindings.insert((M::SHIFT, Char('K')), KeyAction::ToggleKeybindsPane);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        Self { bindings }
    }

    /// Load `path`, or write and return the defaults if it does not exist.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default keybindings");
        }
        km
    }

    /// Read `path` over the defaults; `None` if it cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Start from the defaults, then apply `Action = KeySpec` lines.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for (lhs, rhs) in parse_kv_lines(contents) {
            match (KeyAction::parse(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::debug!(lhs, rhs, "ignoring keybinding line"),
            }
        }
        map
    }

    /// Write every binding to `path`, grouped by action.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        let mut buf = String::new();
        buf.push_str("# user-dashboard keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Delete, Up, Down, Left, Right, PageUp, PageDown, Home, End, /, ?\n\n");
        let mut lines: Vec<(String, &str)> = self
            .bindings
            .iter()
            .map(|((m, c), a)| (Self::format_key(*m, *c), a.name()))
            .collect();
        lines.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        for (key, action) in lines {
            let _ = writeln!(buf, "{action} = {key}");
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, buf)
    }

    /// Look up the action bound to `key`, if any.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .get(&(key.modifiers, key.code))
            .or_else(|| {
                // uppercase letters often arrive with SHIFT set
                key.modifiers
                    .contains(KeyModifiers::SHIFT)
                    .then(|| self.bindings.get(&(key.modifiers - KeyModifiers::SHIFT, key.code)))
                    .flatten()
            })
            .copied()
    }

    /// Keys bound to each action, formatted and sorted, in `KeyAction::ALL` order.
    pub fn keys_by_action(&self) -> Vec<(KeyAction, Vec<String>)> {
        KeyAction::ALL
            .into_iter()
            .filter(|a| *a != KeyAction::Ignore)
            .map(|a| {
                let mut keys: Vec<String> = self
                    .bindings
                    .iter()
                    .filter(|(_, bound)| **bound == a)
                    .map(|((m, c), _)| Self::format_key(*m, *c))
                    .collect();
                keys.sort();
                keys.dedup();
                (a, keys)
            })
            .filter(|(_, keys)| !keys.is_empty())
            .collect()
    }

    /// Human-readable key spec such as `Ctrl+q` or `PageDown`.
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Char(c) => c.to_string(),
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Backspace => "Backspace".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            other => format!("{other:?}"),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{base}")
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Backspace" => Backspace,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}
