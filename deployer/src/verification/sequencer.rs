// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::time::Duration;

use alloy_primitives::Address;
use deploy_core::network::NetworkConfig;
use deploy_core::plan::DeploymentPlan;
use tracing::{info, warn};

use super::{
    VerificationOutcome, VerificationRequest, VerificationRunError, VerificationStatus, Verifier,
};
use crate::error_chain;
use crate::store::ManifestStore;

/// Pause after every submission. Explorers rate-limit source uploads.
pub const DEFAULT_VERIFY_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub name: String,
    pub address: Address,
    pub outcome: VerificationOutcome,
}

pub struct VerificationSequencer<V: Verifier> {
    verifier: V,
    delay: Duration,
}

impl<V: Verifier> VerificationSequencer<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            delay: DEFAULT_VERIFY_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Submits every request in order. One report per request, in the same
    /// order; a failure is recorded and does not stop the run.
    pub async fn run(&self, requests: &[VerificationRequest]) -> Vec<VerificationReport> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            info!(name = %request.name, address = %request.address, "verifying");
            let outcome = match self.verifier.verify_contract(request).await {
                Ok(status) => {
                    if status == VerificationStatus::AlreadyVerified {
                        info!(name = %request.name, "already verified");
                    } else {
                        info!(name = %request.name, "verified");
                    }
                    VerificationOutcome::from(status)
                }
                Err(err) => {
                    let reason = error_chain(&err);
                    warn!(name = %request.name, error = %reason, "verification failed, continuing");
                    VerificationOutcome::Failed(reason)
                }
            };
            reports.push(VerificationReport {
                name: request.name.clone(),
                address: request.address,
                outcome,
            });
            tokio::time::sleep(request.pause.unwrap_or(self.delay)).await;
        }

        let failed = reports.iter().filter(|r| !r.outcome.is_success()).count();
        info!(submitted = reports.len(), failed, "verification run finished");
        reports
    }
}

/// Rebuilds the requests of a deployed package from its manifest and the
/// manifests it depends on, then verifies them.
pub async fn verify_package<V: Verifier>(
    sequencer: &VerificationSequencer<V>,
    store: &ManifestStore,
    plan: &DeploymentPlan,
    config: &NetworkConfig,
) -> Result<Vec<VerificationReport>, VerificationRunError> {
    let load_err = |source| VerificationRunError::LoadManifest { source };
    let own = store.read(&plan.package, &config.name).map_err(load_err)?;
    let externals = store
        .load_externals(plan.external_packages(), &config.name)
        .map_err(load_err)?;
    let requests = plan
        .verification_requests(config, &own, &externals)
        .map_err(|source| VerificationRunError::Resolve {
            package: plan.package.clone(),
            source,
        })?;

    info!(package = %plan.package, network = %config.name, contracts = requests.len(), "verification started");
    Ok(sequencer.run(&requests).await)
}
