//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sozi/sozi.toml`
//! 3. Local config: `<dir>/.sozi.toml` (usually the document's directory)
//! 4. Environment variables: `SOZI_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{
    LayerRules, PresentationOptions, DEFAULT_DRAWABLE_TAGS, DEFAULT_FRAME_TITLE,
    INKSCAPE_NAMESPACE,
};

/// Layer partitioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayerConfig {
    /// Tags eligible for layer membership
    pub drawable_tags: Vec<String>,
    /// Tag of authored groups that may become explicit layers
    pub group_tag: String,
    /// Namespace of the editor label attribute (empty for none)
    pub label_namespace: String,
    /// Local name of the editor label attribute
    pub label_attribute: String,
    /// Prefix of synthesized wrapper ids
    pub wrapper_prefix: String,
    /// Remove text and comment children of the root while building layers
    pub strip_non_elements: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            drawable_tags: DEFAULT_DRAWABLE_TAGS.iter().map(|t| t.to_string()).collect(),
            group_tag: "g".into(),
            label_namespace: INKSCAPE_NAMESPACE.into(),
            label_attribute: "label".into(),
            wrapper_prefix: "sozi-wrapper".into(),
            strip_non_elements: true,
        }
    }
}

/// Raw layer config for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayerConfig {
    pub drawable_tags: Option<Vec<String>>,
    pub group_tag: Option<String>,
    pub label_namespace: Option<String>,
    pub label_attribute: Option<String>,
    pub wrapper_prefix: Option<String>,
    pub strip_non_elements: Option<bool>,
}

/// Frame defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrameConfig {
    pub default_title: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_FRAME_TITLE.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFrameConfig {
    pub default_title: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub layers: RawLayerConfig,
    pub frames: RawFrameConfig,
}

impl LayerConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["g", "rect"], &["use"])       // → ["g", "rect", "use"]
    /// merge_array(&["g", "rect"], &["!rect", "use"]) // → ["g", "use"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Sorted for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge a local overlay: scalars replace, `drawable_tags` unions.
    pub fn merge(&self, overlay: &RawLayerConfig) -> Self {
        Self {
            drawable_tags: overlay
                .drawable_tags
                .as_ref()
                .map(|o| Self::merge_array(&self.drawable_tags, o))
                .unwrap_or_else(|| self.drawable_tags.clone()),
            ..self.apply_scalars(overlay)
        }
    }

    /// Apply global config onto defaults: every specified field replaces.
    ///
    /// Unlike `merge()`, a `drawable_tags` array in the global config completely
    /// replaces the compiled default list.
    pub fn apply_global(&self, global: &RawLayerConfig) -> Self {
        Self {
            drawable_tags: global
                .drawable_tags
                .clone()
                .unwrap_or_else(|| self.drawable_tags.clone()),
            ..self.apply_scalars(global)
        }
    }

    fn apply_scalars(&self, overlay: &RawLayerConfig) -> Self {
        Self {
            drawable_tags: self.drawable_tags.clone(),
            group_tag: overlay
                .group_tag
                .clone()
                .unwrap_or_else(|| self.group_tag.clone()),
            label_namespace: overlay
                .label_namespace
                .clone()
                .unwrap_or_else(|| self.label_namespace.clone()),
            label_attribute: overlay
                .label_attribute
                .clone()
                .unwrap_or_else(|| self.label_attribute.clone()),
            wrapper_prefix: overlay
                .wrapper_prefix
                .clone()
                .unwrap_or_else(|| self.wrapper_prefix.clone()),
            strip_non_elements: overlay
                .strip_non_elements
                .unwrap_or(self.strip_non_elements),
        }
    }

    pub fn layer_rules(&self) -> LayerRules {
        let namespace = Some(self.label_namespace.clone()).filter(|ns| !ns.is_empty());
        LayerRules {
            drawable_tags: self.drawable_tags.iter().cloned().collect(),
            group_tag: self.group_tag.clone(),
            label_attribute: (namespace, self.label_attribute.clone()),
            wrapper_prefix: self.wrapper_prefix.clone(),
            strip_non_elements: self.strip_non_elements,
        }
    }
}

impl FrameConfig {
    fn merge(&self, overlay: &RawFrameConfig) -> Self {
        Self {
            default_title: overlay
                .default_title
                .clone()
                .unwrap_or_else(|| self.default_title.clone()),
        }
    }
}

/// Unified configuration for sozi.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Layer partitioning rules
    pub layers: LayerConfig,
    /// Frame defaults
    pub frames: FrameConfig,
}

/// Get the XDG config directory for sozi.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sozi").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sozi.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".sozi.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge a local overlay onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            layers: self.layers.merge(&overlay.layers),
            frames: self.frames.merge(&overlay.frames),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            layers: self.layers.apply_global(&global.layers),
            frames: self.frames.merge(&global.frames),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.sozi.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support (`"!tag"` removes a tag)
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Load only compiled defaults and a specific config file (no global, no env).
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        Ok(Self::default().merge_with(&raw))
    }

    /// Apply SOZI_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`, e.g. `SOZI_LAYERS__STRIP_NON_ELEMENTS=false`;
    /// `SOZI_LAYERS__DRAWABLE_TAGS` is a comma-separated list.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SOZI")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("layers.drawable_tags")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("layers.drawable_tags") {
            settings.layers.drawable_tags = val;
        }
        if let Ok(val) = config.get_string("layers.group_tag") {
            settings.layers.group_tag = val;
        }
        if let Ok(val) = config.get_string("layers.label_namespace") {
            settings.layers.label_namespace = val;
        }
        if let Ok(val) = config.get_string("layers.label_attribute") {
            settings.layers.label_attribute = val;
        }
        if let Ok(val) = config.get_string("layers.wrapper_prefix") {
            settings.layers.wrapper_prefix = val;
        }
        if let Ok(val) = config.get_bool("layers.strip_non_elements") {
            settings.layers.strip_non_elements = val;
        }
        if let Ok(val) = config.get_string("frames.default_title") {
            settings.frames.default_title = val;
        }

        Ok(settings)
    }

    pub fn presentation_options(&self) -> PresentationOptions {
        PresentationOptions {
            layer_rules: self.layers.layer_rules(),
            default_frame_title: self.frames.default_title.clone(),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# sozi configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/sozi/sozi.toml   (defines your baseline)
#   Local:  <dir>/.sozi.toml           (per-document additions)
#   Env:    SOZI_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global; use "!tag" to REMOVE an inherited tag:
#     drawable_tags = ["use", "!clippath"]

[layers]
# Tags eligible to become or belong to a layer
# drawable_tags = ["g", "image", "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text", "clippath"]

# Authored groups with this tag and a unique id become explicit layers
# group_tag = "g"

# Editor label attribute used as the layer label
# label_namespace = "http://www.inkscape.org/namespaces/inkscape"
# label_attribute = "label"

# Synthesized wrapper ids: <prefix>-<presentation>-<n>
# wrapper_prefix = "sozi-wrapper"

# Remove whitespace text and comments at the top level (irreversible)
# strip_non_elements = true

[frames]
# default_title = "New frame"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
