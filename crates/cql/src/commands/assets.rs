//! Loading of the assets file queries are resolved against.
//!
//! The file is JSON:
//!
//! ```json
//! {
//!   "fields": [{"uuid": "...", "key": "age", "name": "Age", "type": "number"}],
//!   "groups": [{"uuid": "...", "name": "Testers", "id": 12}],
//!   "flows": [{"uuid": "...", "name": "Registration", "id": 34}]
//! }
//! ```
//!
//! The integer `id`s are what groups and flows are indexed under.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use contactql::es::AssetMapper;
use contactql::{Field, Flow, Group, Resolver, StaticResolver};
use serde::Deserialize;

use super::config::Config;
use super::{CommandContext, CommandError, Result};

#[derive(Debug, Deserialize)]
struct IndexedGroup {
    #[serde(flatten)]
    group: Group,
    id: i64,
}

#[derive(Debug, Deserialize)]
struct IndexedFlow {
    #[serde(flatten)]
    flow: Flow,
    id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct AssetsFile {
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    groups: Vec<IndexedGroup>,
    #[serde(default)]
    flows: Vec<IndexedFlow>,
}

/// Loaded assets: a resolver plus the index IDs of groups and flows.
#[derive(Debug, Default)]
pub struct Assets {
    pub resolver: StaticResolver,
    group_ids: HashMap<String, i64>,
    flow_ids: HashMap<String, i64>,
}

impl Assets {
    /// Parses an assets file's contents.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: AssetsFile = serde_json::from_str(content)
            .map_err(|e| CommandError::Input(format!("Failed to parse assets: {}", e)))?;

        let group_ids = file
            .groups
            .iter()
            .map(|g| (g.group.uuid.clone(), g.id))
            .collect();
        let flow_ids = file
            .flows
            .iter()
            .map(|f| (f.flow.uuid.clone(), f.id))
            .collect();

        let resolver = StaticResolver::new(
            file.fields,
            file.groups.into_iter().map(|g| g.group).collect(),
            file.flows.into_iter().map(|f| f.flow).collect(),
        );

        Ok(Self {
            resolver,
            group_ids,
            flow_ids,
        })
    }

    /// Reads an assets file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CommandError::Input(format!("Failed to read assets {}: {}", path.display(), e))
        })?;
        let assets = Self::from_json_str(&content)?;

        tracing::debug!(
            path = %path.display(),
            fields = assets.resolver.fields.len(),
            groups = assets.resolver.groups.len(),
            flows = assets.resolver.flows.len(),
            "loaded assets"
        );
        Ok(assets)
    }
}

impl AssetMapper for Assets {
    fn flow(&self, flow: &Flow) -> i64 {
        self.flow_ids.get(&flow.uuid).copied().unwrap_or_default()
    }

    fn group(&self, group: &Group) -> i64 {
        self.group_ids.get(&group.uuid).copied().unwrap_or_default()
    }
}

/// Returns the resolver of loaded assets, if any.
pub fn resolver(assets: Option<&Assets>) -> Option<&dyn Resolver> {
    assets.map(|a| &a.resolver as &dyn Resolver)
}

/// Returns the assets file to use: the `--assets` flag, then the config's.
pub fn assets_path(ctx: &CommandContext, config: &Config) -> Option<PathBuf> {
    ctx.assets_path.clone().or_else(|| config.assets.clone())
}

/// Loads assets if an assets file is configured.
pub fn load_assets(ctx: &CommandContext, config: &Config) -> Result<Option<Assets>> {
    assets_path(ctx, config)
        .map(|path| Assets::load(&path))
        .transpose()
}
