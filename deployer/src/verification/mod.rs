// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Source verification of deployed contracts against a block explorer.
//!
//! Requests are submitted one at a time with a fixed pause in between; a
//! failed verification is reported and the run moves on.

mod error;
mod etherscan;
mod sequencer;

pub use deploy_core::verification::{VerificationOutcome, VerificationRequest};
pub use error::{VerificationRunError, VerifyError};
pub use etherscan::EtherscanVerifier;
pub use sequencer::{
    DEFAULT_VERIFY_DELAY, VerificationReport, VerificationSequencer, verify_package,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Verified,
    AlreadyVerified,
}

impl From<VerificationStatus> for VerificationOutcome {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Verified => Self::Verified,
            VerificationStatus::AlreadyVerified => Self::AlreadyVerified,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Verifier {
    async fn verify_contract(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerifyError>;
}
