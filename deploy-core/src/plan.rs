// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Deployment plans: an ordered list of contract creations whose constructor
//! arguments and library links reference the network config, earlier steps of
//! the same plan, or other packages' manifests.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use alloy_primitives::Address;
use thiserror::Error;

use crate::manifest::{ExternalManifests, Manifest, ManifestError};
use crate::network::{ConfigError, ConfigField, NetworkConfig};
use crate::verification::VerificationRequest;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan {package} has no steps")]
    Empty { package: String },
    #[error("step {step} is declared twice in plan {package}")]
    DuplicateStep { package: String, step: String },
    #[error("step {step} references {referenced}, which is not an earlier step of plan {package}")]
    UnresolvedStepReference {
        package: String,
        step: String,
        referenced: String,
    },
    #[error("step {step} links library {library} to {producer}, which is not an earlier step")]
    UnresolvedLibraryProducer {
        step: String,
        library: String,
        producer: String,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("step {step} of package {package} has no deployed address")]
    StepNotDeployed { package: String, step: String },
    #[error("manifest of package {package} was not loaded for this run")]
    PackageNotLoaded { package: String },
}

/// Where a constructor argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    Literal(Address),
    Config(ConfigField),
    /// Address produced by an earlier step of the same plan.
    Step(String),
    /// Entry of another package's manifest.
    External { package: String, field: String },
}

impl ArgSource {
    pub fn step(name: impl Into<String>) -> Self {
        Self::Step(name.into())
    }

    pub fn external(package: impl Into<String>, field: impl Into<String>) -> Self {
        Self::External {
            package: package.into(),
            field: field.into(),
        }
    }
}

/// Library whose address is spliced into the bytecode at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLink {
    pub library: String,
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
    /// Logical name; also the manifest key.
    pub name: String,
    /// Artifact name handed to the chain client.
    pub contract: String,
    pub args: Vec<ArgSource>,
    pub libraries: Vec<LibraryLink>,
}

impl DeploymentStep {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            contract: name.clone(),
            name,
            args: Vec::new(),
            libraries: Vec::new(),
        }
    }

    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = contract.into();
        self
    }

    pub fn arg(mut self, source: ArgSource) -> Self {
        self.args.push(source);
        self
    }

    /// Links `library` to the address produced by the step of the same name.
    pub fn link(mut self, library: impl Into<String>) -> Self {
        let library = library.into();
        self.libraries.push(LibraryLink {
            step: library.clone(),
            library,
        });
        self
    }

    fn step_references(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ArgSource::Step(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub package: String,
    pub steps: Vec<DeploymentStep>,
}

impl DeploymentPlan {
    pub fn new(package: impl Into<String>, steps: Vec<DeploymentStep>) -> Self {
        Self {
            package: package.into(),
            steps,
        }
    }

    /// Checks that every step only references strictly earlier steps, which
    /// also rules out cycles.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty {
                package: self.package.clone(),
            });
        }

        let mut earlier: HashSet<&str> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            for referenced in step.step_references() {
                if !earlier.contains(referenced) {
                    return Err(PlanError::UnresolvedStepReference {
                        package: self.package.clone(),
                        step: step.name.clone(),
                        referenced: referenced.to_string(),
                    });
                }
            }
            for link in &step.libraries {
                if !earlier.contains(link.step.as_str()) {
                    return Err(PlanError::UnresolvedLibraryProducer {
                        step: step.name.clone(),
                        library: link.library.clone(),
                        producer: link.step.clone(),
                    });
                }
            }
            if !earlier.insert(step.name.as_str()) {
                return Err(PlanError::DuplicateStep {
                    package: self.package.clone(),
                    step: step.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Packages whose manifests must be loaded before the plan can run.
    pub fn external_packages(&self) -> BTreeSet<&str> {
        self.steps
            .iter()
            .flat_map(|step| step.args.iter())
            .filter_map(|arg| match arg {
                ArgSource::External { package, .. } => Some(package.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Resolves every argument that does not depend on this run's own
    /// deployments. Surfaces config and manifest gaps before anything is sent.
    pub fn preflight(
        &self,
        config: &NetworkConfig,
        externals: &ExternalManifests,
    ) -> Result<(), ResolveError> {
        let empty = Manifest::new();
        let resolver = ArgResolver::new(&self.package, config, &empty, externals);
        for arg in self.steps.iter().flat_map(|step| step.args.iter()) {
            if !matches!(arg, ArgSource::Step(_)) {
                resolver.resolve(arg)?;
            }
        }
        Ok(())
    }

    /// Rebuilds the constructor arguments of every deployed step, in
    /// deployment order, with `Step` references read from `deployed`.
    pub fn verification_requests(
        &self,
        config: &NetworkConfig,
        deployed: &Manifest,
        externals: &ExternalManifests,
    ) -> Result<Vec<VerificationRequest>, ResolveError> {
        let resolver = ArgResolver::new(&self.package, config, deployed, externals);
        self.steps
            .iter()
            .map(|step| {
                let address = resolver.resolve_step(&step.name)?;
                Ok(VerificationRequest {
                    name: step.name.clone(),
                    contract: step.contract.clone(),
                    address,
                    args: resolver.resolve_all(&step.args)?,
                    libraries: resolver.resolve_libraries(&step.libraries)?,
                    pause: None,
                })
            })
            .collect()
    }
}

/// Resolves argument sources against one run's inputs. `local` holds the
/// addresses of the plan's own steps that are known so far.
pub struct ArgResolver<'a> {
    package: &'a str,
    config: &'a NetworkConfig,
    local: &'a Manifest,
    externals: &'a ExternalManifests,
}

impl<'a> ArgResolver<'a> {
    pub fn new(
        package: &'a str,
        config: &'a NetworkConfig,
        local: &'a Manifest,
        externals: &'a ExternalManifests,
    ) -> Self {
        Self {
            package,
            config,
            local,
            externals,
        }
    }

    pub fn resolve(&self, source: &ArgSource) -> Result<Address, ResolveError> {
        match source {
            ArgSource::Literal(address) => Ok(*address),
            ArgSource::Config(field) => Ok(self.config.field(*field)?),
            ArgSource::Step(name) => self.resolve_step(name),
            ArgSource::External { package, field } => self
                .externals
                .field(package, field)
                .ok_or_else(|| ResolveError::PackageNotLoaded {
                    package: package.clone(),
                })?
                .map_err(ResolveError::from),
        }
    }

    pub fn resolve_all(&self, sources: &[ArgSource]) -> Result<Vec<Address>, ResolveError> {
        sources.iter().map(|source| self.resolve(source)).collect()
    }

    pub fn resolve_libraries(
        &self,
        links: &[LibraryLink],
    ) -> Result<BTreeMap<String, Address>, ResolveError> {
        links
            .iter()
            .map(|link| Ok((link.library.clone(), self.resolve_step(&link.step)?)))
            .collect()
    }

    fn resolve_step(&self, name: &str) -> Result<Address, ResolveError> {
        self.local
            .get(name)
            .ok_or_else(|| ResolveError::StepNotDeployed {
                package: self.package.to_string(),
                step: name.to_string(),
            })
    }
}

/// ABI encoding of a constructor taking only `address` parameters: each one
/// left-padded to a 32-byte word.
pub fn encode_constructor_args(args: &[Address]) -> Vec<u8> {
    args.iter().flat_map(|arg| arg.into_word().0).collect()
}
