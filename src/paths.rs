//! Application path management for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Dev mode** (debug builds): `config.yaml` in the working directory wins.
//! - **Portable mode**: a `.portable` marker next to the executable keeps all
//!   data files in the executable's directory.
//! - **Installed mode** (default): data lives in the platform data directory
//!   (`%APPDATA%\SoundMixer`, `~/.local/share/SoundMixer`, ...).

use std::path::PathBuf;
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "SoundMixer";

/// File name of the emulated EEPROM image
const EEPROM_FILE: &str = "eeprom.bin";

/// Application paths for config and durable state
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Path to the EEPROM image
    pub eeprom: PathBuf,
    /// Whether running in portable (or dev) mode
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized, so diagnostics go to stderr.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join("config.yaml").exists() {
                eprintln!("[paths] Running in DEV mode (config.yaml found in {})", cwd.display());
                return Self::in_dir(cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::in_dir(exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no data directory, falling back to exe dir");
                exe_dir
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] Running in INSTALLED mode (data dir: {})", app_data.display());

        Self::in_dir(app_data, false)
    }

    fn in_dir(dir: PathBuf, is_portable: bool) -> Self {
        Self {
            config: dir.join("config.yaml"),
            eeprom: dir.join(EEPROM_FILE),
            is_portable,
        }
    }

    /// Directory holding the config file and the default EEPROM image
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure the data directory exists
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.eeprom.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating data directory: {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}
