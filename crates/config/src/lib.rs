//! Configuration loading for rolemap: file discovery, `${VAR}` substitution
//! and environment overrides.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, apply_overrides_from, config_dir, discover_and_load, load_config,
        resolve,
    },
    schema::{CrmConfig, OAuthSection, RolemapConfig, ServerConfig},
};
