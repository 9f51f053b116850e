use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

const LOCAL_FILE: &str = ".civic-board.toml";
const CONFIG_ENV: &str = "CIVIC_BOARD_CONFIG";
const API_URL_ENV: &str = "CIVIC_BOARD_API_URL";

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `.civic-board.toml` between the current directory and the Git root
/// 3. `$CIVIC_BOARD_CONFIG`
/// 4. `$XDG_CONFIG_HOME/civic-board/config.toml`
/// 5. `~/.config/civic-board/config.toml`
///
/// When both a global and a repo-local file exist, local sections replace
/// the global ones; the worker roster is only replaced when the local file
/// lists workers. `$CIVIC_BOARD_API_URL` overrides `backend.base_url` last.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let mut config = if let Some(path) = explicit_path {
        read_config(path)?
    } else {
        match (find_global_config(), find_repo_local_config()) {
            (Some(global), Some(local)) => {
                tracing::debug!(
                    "config: merging {} over {}",
                    local.display(),
                    global.display()
                );
                merge_configs(read_config(&global)?, read_config(&local)?)
            }
            (Some(path), None) | (None, Some(path)) => read_config(&path)?,
            (None, None) => AppConfig::default(),
        }
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML from {}", path.display()))?;
    tracing::debug!("config: loaded {}", path.display());
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        let url = url.trim();
        if !url.is_empty() {
            config.backend.base_url = url.to_owned();
        }
    }
}

/// Overlay a repo-local config on the global one.
pub(crate) fn merge_configs(global: AppConfig, local: AppConfig) -> AppConfig {
    AppConfig {
        backend: local.backend,
        defaults: local.defaults,
        workers: if local.workers.is_empty() {
            global.workers
        } else {
            local.workers
        },
        theme: local.theme,
        keybindings: local.keybindings,
    }
}

fn find_repo_local_config() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(LOCAL_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() || !dir.pop() {
            return None;
        }
    }
}

fn find_global_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("civic-board/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    let home = std::env::var("HOME").ok().map(PathBuf::from)?;
    let p = home.join(".config/civic-board/config.toml");
    p.is_file().then_some(p)
}
