// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use deploy_core::manifest::{ExternalManifests, Manifest};
use deploy_core::network::NetworkConfig;
use deploy_core::plan::{ArgResolver, DeploymentPlan, DeploymentStep};
use tracing::{error, info, warn};

use super::DeploymentError;
use crate::chain::{ChainClient, DeployRequest};
use crate::store::ManifestStore;

pub struct DeploymentSequencer<C: ChainClient> {
    client: C,
}

impl<C: ChainClient> DeploymentSequencer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deploys every step of `plan` in declared order and returns the
    /// addresses produced. Structural problems (plan ordering, config fields,
    /// dependency manifests, wrong chain) are reported before the first
    /// transaction is sent.
    pub async fn run(
        &self,
        plan: &DeploymentPlan,
        config: &NetworkConfig,
        externals: &ExternalManifests,
    ) -> Result<Manifest, DeploymentError> {
        plan.validate()
            .map_err(|source| DeploymentError::Plan { source })?;
        plan.preflight(config, externals)
            .map_err(|source| DeploymentError::Preflight { source })?;
        self.check_chain_id(config).await?;

        info!(
            package = %plan.package,
            network = %config.name,
            steps = plan.steps.len(),
            "deployment started"
        );

        let mut deployed = Manifest::new();
        for step in &plan.steps {
            let request = resolve_request(plan, step, config, &deployed, externals)?;
            info!(step = %step.name, contract = %step.contract, "deploying");

            let address = match self.client.deploy(&request).await {
                Ok(address) => address,
                Err(source) => {
                    error!(step = %step.name, error = %source, "deployment failed, aborting run");
                    for (name, address) in deployed.iter() {
                        warn!(step = name, %address, "deployed in this run but not recorded");
                    }
                    return Err(DeploymentError::Transaction {
                        step: step.name.clone(),
                        deployed,
                        source,
                    });
                }
            };

            info!(step = %step.name, %address, "deployed");
            deployed.insert(step.name.clone(), address);
        }

        info!(package = %plan.package, contracts = deployed.len(), "deployment finished");
        Ok(deployed)
    }

    async fn check_chain_id(&self, config: &NetworkConfig) -> Result<(), DeploymentError> {
        let actual = self
            .client
            .chain_id()
            .await
            .map_err(|source| DeploymentError::ChainId {
                network: config.name.clone(),
                source,
            })?;
        if actual != config.chain_id {
            return Err(DeploymentError::ChainIdMismatch {
                network: config.name.clone(),
                expected: config.chain_id,
                actual,
            });
        }
        if self.client.network_name() != config.name {
            warn!(
                client = self.client.network_name(),
                config = %config.name,
                "client and config name different networks with the same chain id"
            );
        }
        Ok(())
    }
}

fn resolve_request(
    plan: &DeploymentPlan,
    step: &DeploymentStep,
    config: &NetworkConfig,
    deployed: &Manifest,
    externals: &ExternalManifests,
) -> Result<DeployRequest, DeploymentError> {
    let resolver = ArgResolver::new(&plan.package, config, deployed, externals);
    let resolve_err = |source| DeploymentError::Resolve {
        step: step.name.clone(),
        source,
    };
    Ok(DeployRequest {
        contract: step.contract.clone(),
        args: resolver.resolve_all(&step.args).map_err(resolve_err)?,
        libraries: resolver
            .resolve_libraries(&step.libraries)
            .map_err(resolve_err)?,
    })
}

/// Loads the plan's dependency manifests, runs it, and persists the result.
/// A failed run leaves any existing manifest untouched.
pub async fn deploy_package<C: ChainClient>(
    sequencer: &DeploymentSequencer<C>,
    store: &ManifestStore,
    plan: &DeploymentPlan,
    config: &NetworkConfig,
) -> Result<Manifest, DeploymentError> {
    let externals = store
        .load_externals(plan.external_packages(), &config.name)
        .map_err(|source| DeploymentError::LoadExternals { source })?;

    let target = store.path(&plan.package, &config.name);
    if target.exists() {
        warn!(path = %target.display(), "existing manifest will be replaced");
    }

    let manifest = sequencer.run(plan, config, &externals).await?;
    store
        .write(&plan.package, &config.name, &manifest)
        .map_err(|source| DeploymentError::Persist { source })?;
    Ok(manifest)
}
