//! Config files: location, `key = value` parsing, settings and theme.
//!
//! Every file is created with defaults on first start so users have
//! something to edit. Unknown keys and bad values are skipped, never fatal.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use ratatui::style::Color;

use crate::pager::ItemsPerPage;

pub const QUALIFIER: &str = "org";
pub const ORGANIZATION: &str = "user-dashboard";
pub const APP_DIR: &str = "user-dashboard";

/// Directory holding `settings.conf`, `theme.conf` and `keybinds.conf`.
///
/// An explicit override wins; otherwise the platform config directory
/// (`~/.config/user-dashboard` on Linux). `None` when the platform has no
/// home directory to resolve against.
pub fn config_dir(override_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = override_dir {
        return Some(dir.to_path_buf());
    }
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APP_DIR).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Split a config file into trimmed `(key, value)` pairs, skipping comments
/// and lines without both sides.
pub fn parse_kv_lines(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (lhs, rhs) = line.split_once('=')?;
            let (lhs, rhs) = (lhs.trim(), rhs.trim());
            (!lhs.is_empty() && !rhs.is_empty()).then_some((lhs, rhs))
        })
        .collect()
}

fn write_creating_dirs(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Runtime tunables from `settings.conf`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Initial rows per page.
    pub items_per_page: ItemsPerPage,
    /// How many users to request on (re)load.
    pub fetch_limit: usize,
    /// Simulated backend latency.
    pub latency_ms: u64,
    /// How long a notification stays in the status bar.
    pub notification_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            items_per_page: ItemsPerPage::Ten,
            fetch_limit: 100,
            latency_ms: 300,
            notification_secs: 3,
        }
    }
}

impl Settings {
    /// Parse `settings.conf` contents over the defaults.
    pub fn parse(contents: &str) -> Self {
        let mut s = Self::default();
        for (key, val) in parse_kv_lines(contents) {
            match key {
                "items_per_page" => {
                    if let Some(p) = val.parse().ok().and_then(ItemsPerPage::from_count) {
                        s.items_per_page = p;
                    } else {
                        tracing::warn!(value = val, "ignoring items_per_page; expected 10, 25, 50 or 100");
                    }
                }
                "fetch_limit" => {
                    if let Ok(n) = val.parse::<usize>()
                        && n > 0
                    {
                        s.fetch_limit = n;
                    }
                }
                "latency_ms" => s.latency_ms = val.parse().unwrap_or(s.latency_ms),
                "notification_secs" => s.notification_secs = val.parse().unwrap_or(s.notification_secs),
                _ => tracing::debug!(key, "unknown settings key"),
            }
        }
        s
    }

    /// Read and parse `path`; `None` if it cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Write every setting to `path`, creating parent directories.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        let mut buf = String::new();
        buf.push_str("# user-dashboard settings\n");
        buf.push_str("# items_per_page: 10 | 25 | 50 | 100\n\n");
        let _ = writeln!(buf, "items_per_page = {}", self.items_per_page);
        let _ = writeln!(buf, "fetch_limit = {}", self.fetch_limit);
        let _ = writeln!(buf, "latency_ms = {}", self.latency_ms);
        let _ = writeln!(buf, "notification_secs = {}", self.notification_secs);
        write_creating_dirs(path, &buf)
    }

    /// Load `path`, or write and return the defaults if it does not exist.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let s = Self::default();
        if let Err(e) = s.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default settings");
        }
        s
    }
}

/// Color palette for the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub error: Color,
}

impl Theme {
    /// Plain ANSI palette.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            success: Color::Green,
            error: Color::Red,
        }
    }

    /// Catppuccin Mocha.
    pub fn mocha() -> Self {
        // https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            muted: Color::Rgb(0x7f, 0x84, 0x9c),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            success: Color::Rgb(0xa6, 0xe3, 0xa1),
            error: Color::Rgb(0xf3, 0x8b, 0xa8),
        }
    }

    /// Parse `key = color` lines over a base palette (`preset = dark|mocha`,
    /// mocha when absent).
    pub fn parse(contents: &str) -> Self {
        let pairs = parse_kv_lines(contents);
        let mut theme = match pairs.iter().find(|(k, _)| *k == "preset").map(|(_, v)| *v) {
            Some(v) if v.eq_ignore_ascii_case("dark") => Self::dark(),
            _ => Self::mocha(),
        };
        for (key, val) in pairs {
            if key == "preset" {
                continue;
            }
            let Some(color) = parse_color(val) else {
                tracing::debug!(key, value = val, "unparseable theme color");
                continue;
            };
            match key {
                "text" => theme.text = color,
                "muted" => theme.muted = color,
                "title" => theme.title = color,
                "border" => theme.border = color,
                "header_bg" => theme.header_bg = color,
                "header_fg" => theme.header_fg = color,
                "status_bg" => theme.status_bg = color,
                "status_fg" => theme.status_fg = color,
                "highlight_fg" => theme.highlight_fg = color,
                "highlight_bg" => theme.highlight_bg = color,
                "success" => theme.success = color,
                "error" => theme.error = color,
                _ => {}
            }
        }
        theme
    }

    /// Read and parse `path`; `None` if it cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Write the full palette as hex colors to `path`.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        let mut buf = String::new();
        buf.push_str("# user-dashboard theme\n");
        buf.push_str("# Colors: #RRGGBB, RRGGBB or 'reset'\n");
        buf.push_str("# Optional base palette: preset = dark | mocha\n\n");
        for (key, color) in [
            ("text", self.text),
            ("muted", self.muted),
            ("title", self.title),
            ("border", self.border),
            ("header_bg", self.header_bg),
            ("header_fg", self.header_fg),
            ("status_bg", self.status_bg),
            ("status_fg", self.status_fg),
            ("highlight_fg", self.highlight_fg),
            ("highlight_bg", self.highlight_bg),
            ("success", self.success),
            ("error", self.error),
        ] {
            let _ = writeln!(buf, "{key} = {}", color_to_str(color));
        }
        write_creating_dirs(path, &buf)
    }

    /// Load `path`, or write and return the mocha palette if it does not exist.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default theme");
        }
        t
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

/// Parse `#RRGGBB`, `RRGGBB` or `reset`.
fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{r:02X}{g:02X}{b:02X}"),
        Color::Black => "#000000".to_string(),
        Color::Red => "#CC0000".to_string(),
        Color::Green => "#00CC00".to_string(),
        Color::Yellow => "#CCCC00".to_string(),
        Color::Cyan => "#00CCCC".to_string(),
        Color::Gray => "#B3B3B3".to_string(),
        Color::DarkGray => "#4D4D4D".to_string(),
        Color::White => "#FFFFFF".to_string(),
        _ => "reset".to_string(),
    }
}
