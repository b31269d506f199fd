// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Deployment and source verification of the protocol's contract packages.
//!
//! Flow: package plan -> deployment sequencer -> manifest store ->
//! verification sequencer. The deployment sequencer is the only component
//! that sends transactions, one step at a time.
pub mod artifacts;
pub mod chain;
pub mod deployment;
pub mod packages;
pub mod store;
pub mod verification;

pub use deploy_core::{manifest, network, plan};

/// Renders `err` followed by each of its sources, separated by `: `.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
