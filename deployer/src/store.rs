// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Per-package, per-network manifest files under
//! `<root>/<package>/deployments/<network>.json`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use deploy_core::manifest::{ExternalManifests, Manifest, ManifestError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.root.join(package)
    }

    pub fn path(&self, package: &str, network: &str) -> PathBuf {
        self.package_dir(package)
            .join("deployments")
            .join(format!("{network}.json"))
    }

    pub fn read(&self, package: &str, network: &str) -> Result<Manifest, ManifestError> {
        let path = self.path(package, network);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(ManifestError::Missing {
                    package: package.to_string(),
                    network: network.to_string(),
                    path,
                });
            }
            Err(source) => return Err(ManifestError::Io { path, source }),
        };
        let manifest =
            Manifest::from_json(&bytes).map_err(|source| ManifestError::Malformed {
                path: path.clone(),
                source,
            })?;
        debug!(package, network, entries = manifest.len(), "manifest loaded");
        Ok(manifest)
    }

    /// Replaces the manifest atomically: the new content is written and synced
    /// to a sibling temp file which is then renamed over the target. Readers
    /// see either the previous manifest or the complete new one. The directory
    /// is synced after the rename so the new entry survives a crash.
    pub fn write(
        &self,
        package: &str,
        network: &str,
        manifest: &Manifest,
    ) -> Result<PathBuf, ManifestError> {
        let path = self.path(package, network);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        let io_err = |source| ManifestError::Io {
            path: path.clone(),
            source,
        };

        let bytes = manifest
            .to_json_pretty()
            .map_err(|source| ManifestError::Malformed {
                path: path.clone(),
                source,
            })?;

        fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;
        sync_dir(&dir).map_err(io_err)?;

        info!(
            package,
            network,
            entries = manifest.len(),
            path = %path.display(),
            "manifest written"
        );
        Ok(path)
    }

    /// Loads every listed package's manifest. Any missing one is fatal.
    pub fn load_externals<'a>(
        &self,
        packages: impl IntoIterator<Item = &'a str>,
        network: &str,
    ) -> Result<ExternalManifests, ManifestError> {
        let mut externals = ExternalManifests::new(network);
        for package in packages {
            externals.insert(package, self.read(package, network)?);
        }
        Ok(externals)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
