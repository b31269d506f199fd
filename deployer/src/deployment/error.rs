// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use deploy_core::manifest::{Manifest, ManifestError};
use deploy_core::plan::{PlanError, ResolveError};
use thiserror::Error;

use crate::chain::ChainError;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("invalid deployment plan")]
    Plan {
        #[source]
        source: PlanError,
    },
    #[error("cannot load dependency manifests")]
    LoadExternals {
        #[source]
        source: ManifestError,
    },
    #[error("plan inputs cannot be resolved")]
    Preflight {
        #[source]
        source: ResolveError,
    },
    #[error("cannot read chain id of {network}")]
    ChainId {
        network: String,
        #[source]
        source: ChainError,
    },
    #[error("connected chain has id {actual}, but {network} expects {expected}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },
    #[error("cannot resolve arguments of step {step}")]
    Resolve {
        step: String,
        #[source]
        source: ResolveError,
    },
    #[error("deployment of step {step} failed after {} contract(s) were deployed", .deployed.len())]
    Transaction {
        step: String,
        /// Contracts already live on chain from this run; not persisted.
        deployed: Manifest,
        #[source]
        source: ChainError,
    },
    #[error("cannot persist deployment manifest")]
    Persist {
        #[source]
        source: ManifestError,
    },
}
