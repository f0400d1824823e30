use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::print::LabelSet;
use crate::search::{self, SearchField};

const CONFIG_FILE_NAME: &str = "config.toml";
pub const APP_NAME: &str = "matdar";
const DEFAULT_SOURCE: &str = "voters.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from; `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    pub source: SourceConfig,
    pub search: SearchConfig,
    pub labels: LabelSet,
    pub print: PrintConfig,
    pub keys: Keys,
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            source: SourceConfig::default(),
            search: SearchConfig::default(),
            labels: LabelSet::English,
            print: PrintConfig::default(),
            keys: Keys::default(),
            ui: UiFile::default().into(),
        }
    }
}

// =============================================================================
// Record source
// =============================================================================

/// Where the voter list is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::File(expand_tilde(Path::new(trimmed)))
        }
    }

    pub fn display(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub location: Source,
    /// Append a timestamp query parameter to URL sources so caches are bypassed.
    pub cache_bust: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: Source::parse(DEFAULT_SOURCE),
            cache_bust: false,
        }
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Search configuration
// =============================================================================

/// When the result list is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// On every edit of the query.
    Reactive,
    /// Only on the explicit search action; "show all" lists the whole store.
    Manual,
}

impl FromStr for SearchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reactive" => Ok(SearchMode::Reactive),
            "manual" => Ok(SearchMode::Manual),
            _ => bail!("expected \"reactive\" or \"manual\", got \"{}\"", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub fields: Vec<SearchField>,
    pub transliterate: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Reactive,
            fields: search::default_fields(),
            transliterate: false,
        }
    }
}

// =============================================================================
// Print configuration
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct PrintConfig {
    /// Program that receives the print document on stdin (e.g. `lp`).
    pub command: Option<CommandExec>,
    /// File the print document is written to when no command is set.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

// =============================================================================
// UI configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub separator: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Global keys (outside the search input)
    pub global: GlobalKeys,
    /// Keys for search input mode
    pub search_input: SearchInputKeys,
    /// Keys for result list navigation
    pub results: ResultsKeys,
    /// Keys for the detail and help modals
    pub modal: ModalKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub help: Vec<String>,
    pub print: Vec<String>,
    pub show_all: Vec<String>,
    pub reload: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchInputKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResultsKeys {
    pub search: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub close: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            help: vec!["F1".into(), "?".into()],
            print: vec!["p".into(), "F9".into()],
            show_all: vec!["F2".into(), "a".into()],
            reload: vec!["F5".into()],
        }
    }
}

impl Default for SearchInputKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            confirm: vec!["Enter".into()],
            next: vec!["Down".into(), "Tab".into()],
            prev: vec!["Up".into(), "Backtab".into()],
        }
    }
}

impl Default for ResultsKeys {
    fn default() -> Self {
        Self {
            search: vec!["/".into(), "Escape".into()],
            confirm: vec!["Enter".into()],
            next: vec!["j".into(), "Down".into(), "Tab".into()],
            prev: vec!["k".into(), "Up".into(), "Backtab".into()],
            page_down: vec!["PageDown".into()],
            page_up: vec!["PageUp".into()],
        }
    }
}

impl Default for ModalKeys {
    fn default() -> Self {
        Self {
            close: vec!["Escape".into(), "q".into(), "Enter".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

impl Default for KeyBinding {
    fn default() -> Self {
        KeyBinding::Multiple(vec![])
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    search_input: SearchInputKeysFile,
    results: ResultsKeysFile,
    modal: ModalKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    help: KeyBinding,
    print: KeyBinding,
    show_all: KeyBinding,
    reload: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            help: KeyBinding::Multiple(defaults.help),
            print: KeyBinding::Multiple(defaults.print),
            show_all: KeyBinding::Multiple(defaults.show_all),
            reload: KeyBinding::Multiple(defaults.reload),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SearchInputKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for SearchInputKeysFile {
    fn default() -> Self {
        let defaults = SearchInputKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ResultsKeysFile {
    search: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
    page_down: KeyBinding,
    page_up: KeyBinding,
}

impl Default for ResultsKeysFile {
    fn default() -> Self {
        let defaults = ResultsKeys::default();
        Self {
            search: KeyBinding::Multiple(defaults.search),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            page_down: KeyBinding::Multiple(defaults.page_down),
            page_up: KeyBinding::Multiple(defaults.page_up),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModalKeysFile {
    close: KeyBinding,
}

impl Default for ModalKeysFile {
    fn default() -> Self {
        Self {
            close: KeyBinding::Multiple(ModalKeys::default().close),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                help: file.global.help.into_vec(),
                print: file.global.print.into_vec(),
                show_all: file.global.show_all.into_vec(),
                reload: file.global.reload.into_vec(),
            },
            search_input: SearchInputKeys {
                cancel: file.search_input.cancel.into_vec(),
                confirm: file.search_input.confirm.into_vec(),
                next: file.search_input.next.into_vec(),
                prev: file.search_input.prev.into_vec(),
            },
            results: ResultsKeys {
                search: file.results.search.into_vec(),
                confirm: file.results.confirm.into_vec(),
                next: file.results.next.into_vec(),
                prev: file.results.prev.into_vec(),
                page_down: file.results.page_down.into_vec(),
                page_up: file.results.page_up.into_vec(),
            },
            modal: ModalKeys {
                close: file.modal.close.into_vec(),
            },
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'A' means Shift+a, different from 'a').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        match trimmed.to_ascii_lowercase().as_str() {
            "esc" => "escape".to_string(),
            "shift+tab" => "backtab".to_string(),
            "page_up" => "pageup".to_string(),
            "page_down" => "pagedown".to_string(),
            other => other.to_string(),
        }
    }
}

/// Check for collisions within a single context
fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

/// Validate all key bindings for collisions within each context.
/// Global keys are active while the result list has focus, so they share
/// that context.
fn validate_key_bindings(keys: &Keys) -> Result<()> {
    check_context_collisions(
        &[
            ("quit", &keys.global.quit),
            ("help", &keys.global.help),
            ("print", &keys.global.print),
            ("show_all", &keys.global.show_all),
            ("reload", &keys.global.reload),
            ("search", &keys.results.search),
            ("confirm", &keys.results.confirm),
            ("next", &keys.results.next),
            ("prev", &keys.results.prev),
            ("page_down", &keys.results.page_down),
            ("page_up", &keys.results.page_up),
        ],
        "results",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.search_input.cancel),
            ("confirm", &keys.search_input.confirm),
            ("next", &keys.search_input.next),
            ("prev", &keys.search_input.prev),
        ],
        "search_input",
    )?;

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    labels: Option<String>,
    source: SourceFile,
    search: SearchFile,
    print: PrintFile,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceFile {
    location: Option<String>,
    cache_bust: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SearchFile {
    mode: Option<String>,
    fields: Option<Vec<String>>,
    transliterate: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PrintFile {
    command: Option<CommandDef>,
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

impl SearchFile {
    fn into_config(self) -> Result<SearchConfig> {
        let mode = match self.mode.as_deref() {
            None => SearchMode::Reactive,
            Some(raw) => raw.parse().context("invalid search.mode")?,
        };

        let fields = match self.fields {
            None => search::default_fields(),
            Some(keys) => {
                let mut fields = Vec::new();
                for key in keys {
                    let Some(field) = SearchField::from_key(&key) else {
                        bail!(
                            "unknown search field \"{}\", expected one of: full_name, surname, relation_name, house_no, id",
                            key
                        );
                    };
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                if fields.is_empty() {
                    bail!("search.fields must name at least one field");
                }
                fields
            }
        };

        Ok(SearchConfig {
            mode,
            fields,
            transliterate: self.transliterate,
        })
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Directory for print output and the TUI log file.
pub fn data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

/// Load the configuration. An explicit path must exist; the default path
/// falls back to built-in defaults when absent.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let mut config =
        parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse configuration as TOML")?;

    for warning in unknown_keys(&value) {
        eprintln!("warning: {}", warning);
    }

    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    let labels = match cfg_file.labels.as_deref() {
        None => LabelSet::English,
        Some(raw) => raw.parse().context("invalid labels")?,
    };

    let source = SourceConfig {
        location: cfg_file
            .source
            .location
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
            .map(Source::parse)
            .unwrap_or_else(|| Source::parse(DEFAULT_SOURCE)),
        cache_bust: cfg_file.source.cache_bust,
    };

    let search = cfg_file.search.into_config()?;

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    let print = PrintConfig {
        command: cfg_file.print.command.and_then(CommandExec::from_def),
        output: cfg_file.print.output.map(|path| expand_tilde(&path)),
    };

    Ok(Config {
        config_path: None,
        source,
        search,
        labels,
        print,
        keys,
        ui: cfg_file.ui.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn unknown_keys(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(table) = value.as_table() else {
        return warnings;
    };

    let known = HashSet::from(["labels", "source", "search", "print", "keys", "ui"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warnings.push(format!("unknown configuration key `{}`", key));
        }
    }

    let sections: [(&str, &[&str]); 3] = [
        ("source", &["location", "cache_bust"]),
        ("search", &["mode", "fields", "transliterate"]),
        ("print", &["command", "output"]),
    ];
    for (section, known) in sections {
        if let Some(v) = table.get(section) {
            unknown_in_section(v, section, known, &mut warnings);
        }
    }

    if let Some(keys) = table.get("keys").and_then(|v| v.as_table()) {
        let contexts: [(&str, &[&str]); 4] = [
            ("global", &["quit", "help", "print", "show_all", "reload"]),
            ("search_input", &["cancel", "confirm", "next", "prev"]),
            (
                "results",
                &["search", "confirm", "next", "prev", "page_down", "page_up"],
            ),
            ("modal", &["close"]),
        ];
        for key in keys.keys() {
            if !contexts.iter().any(|(name, _)| name == key) {
                warnings.push(format!("unknown keys context `{}`", key));
            }
        }
        for (context, known) in contexts {
            if let Some(v) = keys.get(context) {
                unknown_in_section(v, &format!("keys.{}", context), known, &mut warnings);
            }
        }
    }

    if let Some(ui) = table.get("ui").and_then(|v| v.as_table()) {
        for key in ui.keys() {
            if key != "colors" {
                warnings.push(format!("unknown ui entry `{}`", key));
            }
        }
        if let Some(colors) = ui.get("colors") {
            unknown_in_section(
                colors,
                "ui.colors",
                &[
                    "border",
                    "selection_bg",
                    "selection_fg",
                    "separator",
                    "status_fg",
                    "status_bg",
                ],
                &mut warnings,
            );
        }
    }

    warnings
}

fn unknown_in_section(value: &toml::Value, section: &str, known: &[&str], out: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            out.push(format!("unknown {}.* entry `{}`", section, key));
        }
    }
}

// =============================================================================
// UI config types
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    separator: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(70, 130, 220),
            selection_bg: RgbColor::new(70, 130, 220),
            selection_fg: RgbColor::new(255, 255, 255),
            separator: RgbColor::new(70, 130, 220),
            status_fg: RgbColor::new(255, 255, 255),
            status_bg: RgbColor::new(22, 101, 52),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                separator: file.colors.separator,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.source.location, Source::File(PathBuf::from("voters.json")));
        assert!(!config.source.cache_bust);
        assert_eq!(config.search.mode, SearchMode::Reactive);
        assert_eq!(config.search.fields, search::default_fields());
        assert_eq!(config.labels, LabelSet::English);
        assert!(config.print.command.is_none());
        assert_eq!(config.keys.global.quit, vec!["q".to_string()]);
    }

    #[test]
    fn test_full_config() {
        let raw = r#"
labels = "marathi"

[source]
location = "https://example.org/ward8/voters.json"
cache_bust = true

[search]
mode = "manual"
fields = ["surname", "full_name", "full_name"]
transliterate = true

[print]
command = ["lp", "-d", "office"]

[keys.global]
quit = "x"

[ui.colors]
border = [1, 2, 3]
status_bg = { r = 4, g = 5, b = 6 }
"#;
        let config = parse(raw).unwrap();
        assert_eq!(config.labels, LabelSet::Marathi);
        assert_eq!(
            config.source.location,
            Source::Url("https://example.org/ward8/voters.json".into())
        );
        assert!(config.source.cache_bust);
        assert_eq!(config.search.mode, SearchMode::Manual);
        assert_eq!(
            config.search.fields,
            vec![SearchField::Surname, SearchField::FullName]
        );
        assert!(config.search.transliterate);
        assert_eq!(
            config.print.command,
            Some(CommandExec {
                program: "lp".into(),
                args: vec!["-d".into(), "office".into()],
            })
        );
        assert_eq!(config.keys.global.quit, vec!["x".to_string()]);
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.status_bg, RgbColor::new(4, 5, 6));
    }

    #[test]
    fn test_modes_and_labels_parse() {
        assert_eq!(" Manual ".parse::<SearchMode>().unwrap(), SearchMode::Manual);
        assert_eq!("mr".parse::<LabelSet>().unwrap(), LabelSet::Marathi);
        assert!("eventually".parse::<SearchMode>().is_err());
        let err = parse("labels = \"klingon\"").unwrap_err();
        assert!(format!("{err:#}").contains("invalid labels"));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let err = parse("[search]\nmode = \"eventually\"").unwrap_err();
        assert!(format!("{err:#}").contains("search.mode"));
    }

    #[test]
    fn test_unknown_search_field_is_rejected() {
        let err = parse("[search]\nfields = [\"phone\"]").unwrap_err();
        assert!(format!("{err:#}").contains("unknown search field"));
    }

    #[test]
    fn test_key_collision_is_rejected() {
        let raw = "[keys.global]\nprint = \"q\"";
        let err = parse(raw).unwrap_err();
        assert!(format!("{err:#}").contains("collision"));
    }

    #[test]
    fn test_key_collision_respects_aliases() {
        let raw = "[keys.search_input]\ncancel = \"Esc\"\nconfirm = \"escape\"";
        assert!(parse(raw).is_err());
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let value: toml::Value =
            toml::from_str("colour = 1\n[search]\nfuzzy = true\n[keys.nav]\nx = \"y\"").unwrap();
        let warnings = unknown_keys(&value);
        assert!(warnings.iter().any(|w| w.contains("`colour`")));
        assert!(warnings.iter().any(|w| w.contains("search.* entry `fuzzy`")));
        assert!(warnings.iter().any(|w| w.contains("keys context `nav`")));
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("HTTPS://x.org/v.json"),
            Source::Url("HTTPS://x.org/v.json".into())
        );
        assert_eq!(
            Source::parse(" data/voters.json "),
            Source::File(PathBuf::from("data/voters.json"))
        );
    }

    #[test]
    fn test_simple_print_command() {
        let config = parse("[print]\ncommand = \"lpr\"").unwrap();
        assert_eq!(
            config.print.command,
            Some(CommandExec {
                program: "lpr".into(),
                args: vec![],
            })
        );
        let config = parse("[print]\ncommand = \"  \"").unwrap();
        assert!(config.print.command.is_none());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(&missing)).is_err());
    }
}
