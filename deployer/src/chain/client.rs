// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;
use deploy_core::plan::encode_constructor_args;
use tracing::debug;

use super::{ChainClient, ChainError, DeployRequest};
use crate::artifacts::ArtifactStore;

pub struct AlloyChainClient {
    network: String,
    deployer: Address,
    provider: DynProvider,
    artifacts: ArtifactStore,
}

impl AlloyChainClient {
    /// Connects to `rpc_url` with `signer` as the sending wallet. Bytecode is
    /// taken from `artifacts`.
    pub async fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        network: impl Into<String>,
        artifacts: ArtifactStore,
    ) -> Result<Self, ChainError> {
        let deployer = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect(rpc_url)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?
            .erased();
        Ok(Self {
            network: network.into(),
            deployer,
            provider,
            artifacts,
        })
    }

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl ChainClient for AlloyChainClient {
    fn network_name(&self) -> &str {
        &self.network
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<Address, ChainError> {
        let artifact = self.artifacts.load(&request.contract)?;
        let mut code = artifact.link(&request.libraries)?;
        code.extend(encode_constructor_args(&request.args));

        let tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_deploy_code(code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        debug!(contract = %request.contract, %tx_hash, "creation transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        if !receipt.status() {
            return Err(ChainError::Reverted {
                contract: request.contract.clone(),
                tx_hash,
            });
        }
        receipt
            .contract_address
            .ok_or_else(|| ChainError::MissingContractAddress {
                contract: request.contract.clone(),
                tx_hash,
            })
    }
}
