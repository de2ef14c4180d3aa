//! Configuration.
//!
//! TOML file format; every field has a default so a missing or partial file
//! never blocks startup. A reload builds a complete new [`Config`] and the
//! manager swaps it in wholesale between events.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::input::Modifiers;
use crate::layout::{StackOrientation, MF_MAX, MF_MIN};
use crate::state::NUM_WORKSPACES;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Modifier that prefixes pointer chords ("Mod4", "Alt", ...).
    pub modkey: String,
    /// Gap between windows and toward the screen edge, in pixels.
    pub gaps: u32,
    /// Border stroke width in pixels.
    pub border_width: u32,
    /// Border colors.
    pub colors: ColorConfig,
    /// Default master area ratio.
    pub master_width: f64,
    /// Per-monitor master ratio overrides, by monitor index.
    pub master_widths: Vec<f64>,
    /// Minimum interval between processed drag motions, in milliseconds.
    pub motion_throttle_ms: u64,
    /// Step applied by the master resize actions.
    pub resize_master_amt: f64,
    /// Edge snapping distance for drags, in pixels.
    pub snap_distance: u32,
    /// How stack clients partition their share of the monitor.
    pub stack: StackOrientation,
    /// Focus newly mapped windows.
    pub new_win_focus: bool,
    /// Warp the pointer to the focused window on focus change.
    pub warp_cursor: bool,
    /// Workspace names, padded with "1".."9" when fewer than nine are given.
    pub workspaces: Vec<String>,
    /// Window classes that always start floating.
    pub should_float: Vec<String>,
    /// How `should_float` patterns are matched.
    pub float_match: MatchPolicy,
    /// Key bindings.
    pub bindings: Vec<BindingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modkey: "Mod4".to_string(),
            gaps: 10,
            border_width: 2,
            colors: ColorConfig::default(),
            master_width: 0.6,
            master_widths: Vec::new(),
            motion_throttle_ms: 16,
            resize_master_amt: 0.05,
            snap_distance: 8,
            stack: StackOrientation::Vertical,
            new_win_focus: true,
            warp_cursor: true,
            workspaces: (1..=NUM_WORKSPACES).map(|n| n.to_string()).collect(),
            should_float: Vec::new(),
            float_match: MatchPolicy::Exact,
            bindings: default_bindings(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    /// A missing file yields the defaults; a malformed file is an error the
    /// caller reports (and typically answers by keeping the old config).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::find_config_file);

        match config_path {
            Some(path) if path.exists() => {
                info!("loading configuration from {path:?}");
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path:?}"))?;
                let config: Self = toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file {path:?}"))?;
                Ok(config.sanitized())
            }
            Some(path) => {
                warn!("config file not found at {path:?}, using defaults");
                Ok(Self::default())
            }
            None => {
                info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        let candidate = dirs::config_dir()?.join("slat").join("slat.toml");
        candidate.exists().then_some(candidate)
    }

    /// Clamp out-of-range numeric options instead of rejecting them.
    pub fn sanitized(mut self) -> Self {
        let clamped = self.master_width.clamp(MF_MIN, MF_MAX);
        if (clamped - self.master_width).abs() > f64::EPSILON {
            warn!(
                master_width = self.master_width,
                "master_width out of range, clamping"
            );
        }
        self.master_width = clamped;
        for mw in &mut self.master_widths {
            *mw = mw.clamp(MF_MIN, MF_MAX);
        }
        self.workspaces.truncate(NUM_WORKSPACES);
        self
    }

    /// The configured modifier mask; an unknown name falls back to Mod4.
    pub fn modkey_mask(&self) -> Modifiers {
        let mask = Modifiers::from_mod_name(&self.modkey);
        if mask.is_empty() {
            warn!(modkey = %self.modkey, "unknown modkey, falling back to Mod4");
            Modifiers::SUPER
        } else {
            mask
        }
    }

    /// Master ratio for a monitor index, already clamped.
    pub fn master_width_for(&self, monitor: usize) -> f64 {
        self.master_widths
            .get(monitor)
            .copied()
            .unwrap_or(self.master_width)
            .clamp(MF_MIN, MF_MAX)
    }

    /// Whether a window class should start floating.
    pub fn should_float(&self, class: &str) -> bool {
        match self.float_match {
            MatchPolicy::Exact => self.should_float.iter().any(|p| p == class),
            MatchPolicy::Regex => self.should_float.iter().any(|p| match Regex::new(p) {
                Ok(re) => re.is_match(class),
                Err(e) => {
                    warn!(pattern = %p, "invalid float pattern: {e}");
                    false
                }
            }),
        }
    }
}

/// Matching rule for `should_float` patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Pattern equals the window class exactly.
    #[default]
    Exact,
    /// Pattern is a regular expression matched against the class.
    Regex,
}

/// Border colors as hex strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub focused: String,
    pub unfocused: String,
    /// Highlight for the drop target of a swap drag.
    pub swap: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            focused: "#4c7899".to_string(),
            unfocused: "#333333".to_string(),
            swap: "#2e9ef4".to_string(),
        }
    }
}

/// Resolved border colors, one `0xRRGGBB` value per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderColors {
    pub focused: u32,
    pub unfocused: u32,
    pub swap: u32,
}

impl BorderColors {
    pub const DEFAULT_FOCUSED: u32 = 0x4c_78_99;
    pub const DEFAULT_UNFOCUSED: u32 = 0x33_33_33;
    pub const DEFAULT_SWAP: u32 = 0x2e_9e_f4;

    /// Resolve the configured hex strings, falling back per color on parse
    /// failure. Never fatal.
    pub fn resolve(colors: &ColorConfig) -> Self {
        let parse = |s: &str, fallback: u32| {
            parse_col(s).unwrap_or_else(|| {
                warn!(color = %s, "unparsable color, using default");
                fallback
            })
        };
        Self {
            focused: parse(&colors.focused, Self::DEFAULT_FOCUSED),
            unfocused: parse(&colors.unfocused, Self::DEFAULT_UNFOCUSED),
            swap: parse(&colors.swap, Self::DEFAULT_SWAP),
        }
    }
}

/// Parse a `#rrggbb` / `0xrrggbb` / `rrggbb` color string.
pub fn parse_col(s: &str) -> Option<u32> {
    let hex = s
        .trim()
        .strip_prefix('#')
        .or_else(|| s.trim().strip_prefix("0x"))
        .unwrap_or_else(|| s.trim());
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// One key binding entry as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Chord string, e.g. `Mod4+Shift+Return`.
    pub keys: String,
    /// Command string: `exec <cmd>`, `workspace <n>`, `send <n>`, or a core
    /// action name.
    pub command: String,
}

fn bind(keys: &str, command: &str) -> BindingConfig {
    BindingConfig {
        keys: keys.to_string(),
        command: command.to_string(),
    }
}

/// The built-in binding table.
fn default_bindings() -> Vec<BindingConfig> {
    let mut bindings = vec![
        bind("Mod4+Return", "exec alacritty"),
        bind("Mod4+p", "exec dmenu_run"),
        bind("Mod4+q", "close_focused"),
        bind("Mod4+j", "focus_next"),
        bind("Mod4+k", "focus_prev"),
        bind("Mod4+Shift+j", "move_master_next"),
        bind("Mod4+Shift+k", "move_master_prev"),
        bind("Mod4+m", "set_master"),
        bind("Mod4+l", "resize_master_add"),
        bind("Mod4+h", "resize_master_sub"),
        bind("Mod4+equal", "inc_gaps"),
        bind("Mod4+minus", "dec_gaps"),
        bind("Mod4+space", "toggle_floating"),
        bind("Mod4+Shift+space", "toggle_floating_global"),
        bind("Mod4+f", "toggle_fullscreen"),
        bind("Mod4+r", "reload_config"),
        bind("Mod4+Shift+e", "quit"),
    ];
    for n in 1..=NUM_WORKSPACES {
        bindings.push(bind(&format!("Mod4+{n}"), &format!("workspace {n}")));
        bindings.push(bind(&format!("Mod4+Shift+{n}"), &format!("send {n}")));
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = Config::default();
        assert_eq!(config.gaps, 10);
        assert_eq!(config.workspaces.len(), NUM_WORKSPACES);
        assert!(!config.bindings.is_empty());
        assert_eq!(config.modkey_mask(), Modifiers::SUPER);
    }

    #[test]
    fn toml_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gaps, config.gaps);
        assert_eq!(parsed.bindings, config.bindings);
        assert_eq!(parsed.colors.focused, config.colors.focused);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("gaps = 4\nmodkey = \"Alt\"").unwrap();
        assert_eq!(parsed.gaps, 4);
        assert_eq!(parsed.modkey_mask(), Modifiers::ALT);
        assert_eq!(parsed.border_width, 2);
    }

    #[test]
    fn parse_col_accepts_common_forms() {
        assert_eq!(parse_col("#ff8800"), Some(0xff8800));
        assert_eq!(parse_col("0x112233"), Some(0x112233));
        assert_eq!(parse_col("a0b0c0"), Some(0xa0b0c0));
        assert_eq!(parse_col("#fff"), None);
        assert_eq!(parse_col("not-a-color"), None);
    }

    #[test]
    fn bad_colors_fall_back_to_defaults() {
        let colors = ColorConfig {
            focused: "#deadbe".to_string(),
            unfocused: "chartreuse".to_string(),
            swap: String::new(),
        };
        let resolved = BorderColors::resolve(&colors);
        assert_eq!(resolved.focused, 0xdeadbe);
        assert_eq!(resolved.unfocused, BorderColors::DEFAULT_UNFOCUSED);
        assert_eq!(resolved.swap, BorderColors::DEFAULT_SWAP);
    }

    #[test]
    fn out_of_range_master_width_is_clamped() {
        let config = Config {
            master_width: 7.0,
            master_widths: vec![0.0, 0.5],
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.master_width, MF_MAX);
        assert_eq!(config.master_width_for(0), MF_MIN);
        assert_eq!(config.master_width_for(1), 0.5);
        assert_eq!(config.master_width_for(7), MF_MAX);
    }

    #[test]
    fn float_rules_respect_policy() {
        let mut config = Config {
            should_float: vec!["mpv".to_string()],
            ..Default::default()
        };
        assert!(config.should_float("mpv"));
        assert!(!config.should_float("mpv-extra"));

        config.float_match = MatchPolicy::Regex;
        config.should_float = vec!["^mpv".to_string(), "[".to_string()];
        assert!(config.should_float("mpv-extra"));
        assert!(!config.should_float("xterm"));
    }
}
