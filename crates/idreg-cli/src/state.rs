//! # State File
//!
//! The registry snapshot (configuration, collections, audit log) and the
//! logical height, stored together as one pretty-printed JSON document.
//!
//! Loads run [`Registry::check_integrity`] so a hand-edited or truncated
//! file is refused instead of served. Saves write a sibling temp file and
//! rename it over the target.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use idreg_core::{Address, BlockHeight};
use idreg_registry::{CallContext, Registry, RegistryConfig};

/// On-disk form of a hosted registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    /// Height of the most recent committed mutation.
    pub height: BlockHeight,
    pub registry: Registry,
}

impl StateFile {
    /// Fresh state at genesis.
    pub fn new(config: RegistryConfig, admins: Vec<Address>) -> Result<Self> {
        config.validate().context("invalid registry configuration")?;
        let registry = Registry::new(config, admins).context("cannot create registry")?;
        Ok(Self {
            height: BlockHeight::GENESIS,
            registry,
        })
    }

    /// Read and verify a state file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "state file not found: {} (run `idreg init` first)",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        state
            .registry
            .check_integrity()
            .with_context(|| format!("state file {} failed integrity check", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            height = %state.height,
            records = state.registry.len(),
            "state loaded"
        );
        Ok(state)
    }

    /// Write the state, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), height = %self.height, "state saved");
        Ok(())
    }

    /// Context for the next mutating call by `caller`: one past the
    /// current height.
    pub fn next_call(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.height.next())
    }

    /// Record that the call at `ctx` committed.
    pub fn commit(&mut self, ctx: &CallContext) {
        self.height = ctx.height;
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
