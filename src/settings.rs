use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A widget position on the desktop, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The persisted appearance/layout document. One instance per process,
/// owned by the [`SettingsStore`]; consumers only ever see clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_system_widget_position")]
    pub system_widget_position: Position,
    #[serde(default = "default_clock_widget_position")]
    pub clock_widget_position: Position,
    /// Accent color as a `#RRGGBB` string. Stored and forwarded verbatim;
    /// parsing is the renderer's problem.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    /// Widget background color as a `#RRGGBB` string.
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Widget opacity in [0.0, 1.0].
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_show_widget")]
    pub show_system_widget: bool,
    #[serde(default = "default_show_widget")]
    pub show_clock_widget: bool,
}

fn default_system_widget_position() -> Position { Position::new(50.0, 50.0) }
fn default_clock_widget_position() -> Position { Position::new(300.0, 50.0) }
fn default_primary_color() -> String { "#0078D4".into() }
fn default_background_color() -> String { "#1E1E1E".into() }
fn default_opacity() -> f64 { 0.9 }
fn default_show_widget() -> bool { true }

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_widget_position: default_system_widget_position(),
            clock_widget_position: default_clock_widget_position(),
            primary_color: default_primary_color(),
            background_color: default_background_color(),
            opacity: default_opacity(),
            show_system_widget: default_show_widget(),
            show_clock_widget: default_show_widget(),
        }
    }
}

impl Settings {
    /// Clamp numeric fields to valid ranges. Colors are deliberately left
    /// alone: the core stores and forwards them without validation.
    fn sanitize(&mut self) {
        self.opacity = self.opacity.clamp(0.0, 1.0);
    }
}

/// Persistence error for the settings subsystem.
#[derive(Debug, Clone)]
pub enum SettingsError {
    /// The document could not be serialized.
    Serialize(String),
    /// The document could not be written to disk.
    Write(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Serialize(e) => write!(f, "Settings serialization failed: {e}"),
            SettingsError::Write(e) => write!(f, "Settings write failed: {e}"),
        }
    }
}

/// Owns the settings document and its on-disk location.
///
/// Loading is fail-open: a missing or corrupt file yields defaults and
/// never an error, so a broken document can't block startup. Saving is
/// best-effort: failures are logged and recorded in `last_error`, and the
/// in-memory value stays authoritative for the running session.
pub struct SettingsStore {
    path: PathBuf,
    current: Settings,
    /// Last persistence error, exposed for user feedback.
    pub last_error: Option<SettingsError>,
}

impl SettingsStore {
    /// Config path: Windows → AppData/Local/Desklet/settings.json,
    /// Linux → ~/.config/Desklet/settings.json
    fn default_path() -> PathBuf {
        dirs::config_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Desklet")
            .join("settings.json")
    }

    /// Open the store at the fixed per-user path and load the document.
    pub fn open() -> Self {
        Self::open_at(Self::default_path())
    }

    /// Open the store against an explicit path (embedders, tests).
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Self::read_document(&path);
        Self {
            path,
            current,
            last_error: None,
        }
    }

    fn read_document(path: &Path) -> Settings {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let mut settings: Settings =
                    serde_json::from_str(&contents).unwrap_or_else(|e| {
                        log::warn!("invalid settings file, using defaults: {e}");
                        Settings::default()
                    });
                settings.sanitize();
                settings
            }
            // Missing file is the expected first-run case; anything else
            // (permissions, I/O) is worth a warning before falling open.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                log::warn!("unreadable settings file, using defaults: {e}");
                Settings::default()
            }
        }
    }

    /// Re-read the document from disk. Missing or malformed content yields
    /// `Settings::default()`; this never fails.
    pub fn load(&mut self) -> Settings {
        self.current = Self::read_document(&self.path);
        self.current.clone()
    }

    /// Snapshot of the in-memory document.
    pub fn current(&self) -> Settings {
        self.current.clone()
    }

    /// Adopt `settings` as the authoritative value and best-effort persist
    /// it. A persistence failure is logged, not surfaced.
    pub fn save(&mut self, settings: Settings) {
        self.current = settings;
        match self.try_save(&self.current) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                log::warn!("failed to save settings: {e}");
                self.last_error = Some(e);
            }
        }
    }

    /// Serialize the full document and write it atomically (temp file then
    /// rename), creating the parent directory if absent.
    pub fn try_save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| SettingsError::Write(e.to_string()))?;

            // Set restrictive permissions on the config directory (Unix only)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
            }
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|e| SettingsError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| SettingsError::Write(e.to_string()))?;

        // Set restrictive permissions on the file itself (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }

        Ok(())
    }
}
