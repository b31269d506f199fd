// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::collections::BTreeMap;
use std::path::PathBuf;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no deployment manifest for package {package} on {network} at {}", .path.display())]
    Missing {
        package: String,
        network: String,
        path: PathBuf,
    },
    #[error("deployment manifest of package {package} on {network} has no entry {field}")]
    FieldMissing {
        package: String,
        network: String,
        field: String,
    },
    #[error("cannot access deployment manifest at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed deployment manifest at {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contract logical name -> deployed address for one package on one network.
///
/// Keys are kept sorted so the file on disk diffs cleanly between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, Address>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, address: Address) -> Option<Address> {
        self.entries.insert(name.into(), address)
    }

    pub fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries
            .iter()
            .map(|(name, address)| (name.as_str(), *address))
    }

    /// 2-space indented JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl FromIterator<(String, Address)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Manifests of other packages a run depends on, all for the same network.
#[derive(Debug, Clone)]
pub struct ExternalManifests {
    network: String,
    manifests: BTreeMap<String, Manifest>,
}

impl ExternalManifests {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            manifests: BTreeMap::new(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn insert(&mut self, package: impl Into<String>, manifest: Manifest) {
        self.manifests.insert(package.into(), manifest);
    }

    pub fn is_loaded(&self, package: &str) -> bool {
        self.manifests.contains_key(package)
    }

    /// `None` when the package was never loaded, `Some(Err)` when the
    /// manifest exists but lacks the entry.
    pub fn field(&self, package: &str, field: &str) -> Option<Result<Address, ManifestError>> {
        let manifest = self.manifests.get(package)?;
        Some(
            manifest
                .get(field)
                .ok_or_else(|| ManifestError::FieldMissing {
                    package: package.to_string(),
                    network: self.network.clone(),
                    field: field.to_string(),
                }),
        )
    }
}
