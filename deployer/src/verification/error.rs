// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use deploy_core::manifest::ManifestError;
use deploy_core::plan::ResolveError;
use thiserror::Error;

use crate::artifacts::ArtifactError;

/// Failure of a single verification. Never aborts a run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("explorer request failed")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("cannot encode compiler input")]
    Encode(#[from] serde_json::Error),
    #[error("compiler input of {contract} is not a standard-JSON object")]
    InvalidCompilerInput { contract: String },
    #[error("explorer rejected the submission: {reason}")]
    Rejected { reason: String },
    #[error("verification {guid} still pending after {attempts} status checks")]
    Timeout { guid: String, attempts: u32 },
    #[error("network {network} has no block explorer configured")]
    Unsupported { network: String },
}

/// Problems that stop a verification run before the first submission.
#[derive(Debug, Error)]
pub enum VerificationRunError {
    #[error("cannot load manifests for verification")]
    LoadManifest {
        #[source]
        source: ManifestError,
    },
    #[error("cannot rebuild constructor arguments of package {package}")]
    Resolve {
        package: String,
        #[source]
        source: ResolveError,
    },
}
