use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RolemapConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "rolemap.toml",
    "rolemap.yaml",
    "rolemap.yml",
    "rolemap.json",
];

/// Load config from the given path (any supported format).
///
/// Environment overrides are not applied; see [`apply_env_overrides`].
pub fn load_config(path: &Path) -> anyhow::Result<RolemapConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Resolve the effective config.
///
/// An explicit path must load successfully. Without one, the standard
/// locations are searched:
/// 1. `./rolemap.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/rolemap/rolemap.{toml,yaml,yml,json}` (user-global)
///
/// A discovered file that fails to parse falls back to defaults with a
/// warning. Environment overrides are applied last in every case.
pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<RolemapConfig> {
    let mut config = match explicit {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Returns `RolemapConfig::default()` if no usable config file is found.
pub fn discover_and_load() -> RolemapConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return RolemapConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            RolemapConfig::default()
        },
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/rolemap/
    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns `~/.config/rolemap/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("rolemap"))
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut RolemapConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Apply overrides resolved through `lookup`.
///
/// Empty values are treated as unset.
pub fn apply_overrides_from(config: &mut RolemapConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("HUBSPOT_CLIENT_ID") {
        config.oauth.client_id = v;
    }
    if let Some(v) = get("HUBSPOT_CLIENT_SECRET") {
        config.oauth.client_secret = Some(Secret::new(v));
    }
    if let Some(v) = get("HUBSPOT_ACCESS_TOKEN") {
        config.oauth.access_token = Some(Secret::new(v));
    }
    if let Some(v) = get("HUBSPOT_REFRESH_TOKEN") {
        config.oauth.refresh_token = Some(Secret::new(v));
    }
    if let Some(v) = get("HUBSPOT_EXPIRES_AT") {
        match v.trim().parse::<u64>() {
            Ok(ms) => config.oauth.expires_at = Some(ms),
            Err(e) => warn!(value = %v, error = %e, "ignoring invalid HUBSPOT_EXPIRES_AT"),
        }
    }
    if let Some(v) = get("PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %v, error = %e, "ignoring invalid PORT"),
        }
    }
    if let Some(v) = get("ROLEMAP_FRONTEND_ORIGIN") {
        config.server.frontend_origin = v;
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RolemapConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
