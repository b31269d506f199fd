// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use alloy_primitives::Address;

/// One source-verification submission. `args` must match the deployment-time
/// constructor arguments positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub name: String,
    pub contract: String,
    pub address: Address,
    pub args: Vec<Address>,
    /// Library name -> address linked into the deployed bytecode.
    pub libraries: BTreeMap<String, Address>,
    /// Overrides the sequencer's pause after this submission.
    pub pause: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Verified | Self::AlreadyVerified)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("verified"),
            Self::AlreadyVerified => f.write_str("already verified"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
