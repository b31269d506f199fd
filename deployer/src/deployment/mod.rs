// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Executes a deployment plan step by step against a chain client.
//!
//! Flow: validate plan -> preflight config/manifests -> check chain id ->
//! deploy each step in order -> hand the manifest to the store.
//! A failed creation aborts the run; nothing is retried.

mod error;
mod sequencer;

pub use error::DeploymentError;
pub use sequencer::{DeploymentSequencer, deploy_package};
