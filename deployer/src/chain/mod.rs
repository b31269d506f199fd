// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Seam between the sequencers and the chain toolchain. The sequencers only
//! see `ChainClient`; `AlloyChainClient` is the production implementation.

mod client;

use std::collections::BTreeMap;

use alloy_primitives::{Address, TxHash};
use thiserror::Error;

use crate::artifacts::ArtifactError;

pub use client::AlloyChainClient;

/// A fully resolved contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub contract: String,
    pub args: Vec<Address>,
    pub libraries: BTreeMap<String, Address>,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("provider/transport: {0}")]
    Provider(String),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("creation of {contract} reverted in transaction {tx_hash}")]
    Reverted { contract: String, tx_hash: TxHash },
    #[error("receipt of transaction {tx_hash} creating {contract} has no contract address")]
    MissingContractAddress { contract: String, tx_hash: TxHash },
}

#[allow(async_fn_in_trait)]
pub trait ChainClient {
    fn network_name(&self) -> &str;

    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Sends the creation transaction and waits until it is mined.
    async fn deploy(&self, request: &DeployRequest) -> Result<Address, ChainError>;
}
