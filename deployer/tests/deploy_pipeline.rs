// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use deployer::chain::{ChainClient, ChainError, DeployRequest};
use deployer::deployment::{DeploymentError, DeploymentSequencer, deploy_package};
use deployer::manifest::{Manifest, ManifestError};
use deployer::network::{NetworkConfig, NetworkRegistry};
use deployer::packages;
use deployer::store::ManifestStore;
use deployer::verification::{
    VerificationOutcome, VerificationRequest, VerificationSequencer, VerificationStatus, Verifier,
    VerifyError, verify_package,
};
use tempfile::TempDir;

const NETWORK: &str = "bscTestnet";
const CHAIN_ID: u64 = 97;

/// In-memory chain: the n-th creation gets `repeat_byte(0x40 + n)`.
struct FakeChain {
    fail_at: Option<usize>,
    calls: Mutex<Vec<DeployRequest>>,
}

impl FakeChain {
    fn new() -> Self {
        Self {
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<DeployRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

fn fake_address(call: usize) -> Address {
    Address::repeat_byte(0x40 + call as u8)
}

impl ChainClient for FakeChain {
    fn network_name(&self) -> &str {
        NETWORK
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(CHAIN_ID)
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<Address, ChainError> {
        let mut calls = self.calls.lock().expect("calls lock");
        calls.push(request.clone());
        let n = calls.len();
        if self.fail_at == Some(n) {
            return Err(ChainError::Reverted {
                contract: request.contract.clone(),
                tx_hash: B256::repeat_byte(0xee),
            });
        }
        Ok(fake_address(n))
    }
}

/// Records what it was asked to verify; every contract verifies.
#[derive(Default)]
struct RecordingVerifier {
    seen: Mutex<Vec<VerificationRequest>>,
}

impl Verifier for RecordingVerifier {
    async fn verify_contract(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerifyError> {
        self.seen.lock().expect("seen lock").push(request.clone());
        Ok(VerificationStatus::Verified)
    }
}

fn bsc_testnet() -> NetworkConfig {
    NetworkRegistry::builtin()
        .resolve(NETWORK)
        .expect("bscTestnet configured")
}

fn manifest(entries: &[(&str, u8)]) -> Manifest {
    entries
        .iter()
        .map(|(name, byte)| (name.to_string(), Address::repeat_byte(*byte)))
        .collect()
}

/// Writes the manifests the router plan depends on.
fn seed_router_dependencies(store: &ManifestStore) {
    store
        .write(
            packages::V3_CORE,
            NETWORK,
            &manifest(&[("PancakeV3PoolDeployer", 0x11), ("PancakeV3Factory", 0x12)]),
        )
        .expect("write v3-core");
    store
        .write(
            packages::V3_PERIPHERY,
            NETWORK,
            &manifest(&[("NonfungiblePositionManager", 0x21)]),
        )
        .expect("write v3-periphery");
    store
        .write(
            packages::MASTERCHEF_V3,
            NETWORK,
            &manifest(&[
                ("MasterChefV3", 0x31),
                ("StableSwapFactory", 0x32),
                ("StableSwapInfo", 0x33),
            ]),
        )
        .expect("write masterchef-v3");
}

#[tokio::test]
async fn v3_core_deployment_writes_its_manifest() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    let sequencer = DeploymentSequencer::new(FakeChain::new());

    let deployed = deploy_package(&sequencer, &store, &packages::v3_core(), &bsc_testnet())
        .await
        .expect("deploy v3-core");

    let on_disk = store.read(packages::V3_CORE, NETWORK).expect("read manifest");
    assert_eq!(on_disk, deployed);
    assert_eq!(on_disk.get("PancakeV3PoolDeployer"), Some(fake_address(1)));
    assert_eq!(on_disk.get("PancakeV3Factory"), Some(fake_address(2)));

    let calls = sequencer.client().calls();
    assert_eq!(calls[1].contract, "PancakeV3Factory");
    assert_eq!(calls[1].args, vec![fake_address(1)]);

    let text = std::fs::read_to_string(store.path(packages::V3_CORE, NETWORK)).expect("read file");
    assert!(text.starts_with("{\n  \""));
}

#[tokio::test]
async fn router_deployment_wires_dependency_manifests_and_config() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    seed_router_dependencies(&store);
    let config = bsc_testnet();
    let wnative = config.wnative.expect("wnative");
    let sequencer = DeploymentSequencer::new(FakeChain::new());

    let deployed = deploy_package(&sequencer, &store, &packages::router(), &config)
        .await
        .expect("deploy router");
    assert_eq!(deployed.len(), 6);

    let calls = sequencer.client().calls();
    let factory_v2 = fake_address(1);
    let helper = fake_address(2);
    assert_eq!(calls[0].contract, "PancakeFactory");
    assert_eq!(calls[0].args, vec![Address::ZERO]);
    assert_eq!(calls[2].contract, "SmartRouter");
    assert_eq!(
        calls[2].args,
        vec![
            factory_v2,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x12),
            Address::repeat_byte(0x21),
            Address::repeat_byte(0x32),
            Address::repeat_byte(0x33),
            wnative,
        ]
    );
    for call in &calls[2..] {
        assert_eq!(call.libraries.get("SmartRouterHelper"), Some(&helper));
    }
    assert_eq!(
        calls[5].args,
        vec![factory_v2, Address::repeat_byte(0x21)]
    );
}

#[tokio::test]
async fn revert_mid_run_leaves_previous_manifest_untouched() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    seed_router_dependencies(&store);
    let previous = manifest(&[("FactoryV2", 0x99)]);
    store
        .write(packages::ROUTER, NETWORK, &previous)
        .expect("write previous router manifest");
    let sequencer = DeploymentSequencer::new(FakeChain::failing_at(3));

    let err = deploy_package(&sequencer, &store, &packages::router(), &bsc_testnet())
        .await
        .expect_err("third creation reverts");

    match err {
        DeploymentError::Transaction { step, deployed, .. } => {
            assert_eq!(step, "SmartRouter");
            assert_eq!(deployed.get("FactoryV2"), Some(fake_address(1)));
            assert_eq!(deployed.get("SmartRouterHelper"), Some(fake_address(2)));
            assert_eq!(deployed.len(), 2);
        }
        other => panic!("expected Transaction error, got {other:?}"),
    }
    assert_eq!(sequencer.client().calls().len(), 3);
    assert_eq!(
        store.read(packages::ROUTER, NETWORK).expect("read"),
        previous
    );
}

#[tokio::test]
async fn missing_dependency_manifest_stops_before_any_transaction() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    let sequencer = DeploymentSequencer::new(FakeChain::new());

    let err = deploy_package(&sequencer, &store, &packages::masterchef_v3(), &bsc_testnet())
        .await
        .expect_err("v3-periphery manifest absent");

    assert!(matches!(
        err,
        DeploymentError::LoadExternals {
            source: ManifestError::Missing { ref package, .. }
        } if package == packages::V3_PERIPHERY
    ));
    assert!(sequencer.client().calls().is_empty());
    assert!(!store.path(packages::MASTERCHEF_V3, NETWORK).exists());
}

#[tokio::test]
async fn verification_replays_deployment_arguments_in_order() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    seed_router_dependencies(&store);
    let config = bsc_testnet();
    let deployment = DeploymentSequencer::new(FakeChain::new());
    deploy_package(&deployment, &store, &packages::masterchef_v3(), &config)
        .await
        .expect("deploy masterchef-v3");
    let calls = deployment.client().calls();

    let sequencer =
        VerificationSequencer::new(RecordingVerifier::default()).with_delay(Duration::ZERO);
    let reports = verify_package(&sequencer, &store, &packages::masterchef_v3(), &config)
        .await
        .expect("verify masterchef-v3");

    assert_eq!(reports.len(), 6);
    assert!(
        reports
            .iter()
            .all(|r| r.outcome == VerificationOutcome::Verified)
    );
    let seen = sequencer.verifier().seen.lock().expect("seen lock").clone();
    for (request, call) in seen.iter().zip(&calls) {
        assert_eq!(request.contract, call.contract);
        assert_eq!(request.args, call.args);
    }
    assert_eq!(seen[0].name, "MasterChefV3");
    assert_eq!(seen[0].address, fake_address(1));
    assert_eq!(
        seen[0].args,
        vec![
            config.cake.expect("cake"),
            Address::repeat_byte(0x21),
            config.wnative.expect("wnative"),
        ]
    );
}

#[tokio::test]
async fn verification_of_undeployed_package_fails_before_submitting() {
    let dir = TempDir::new().expect("temp dir");
    let store = ManifestStore::new(dir.path());
    let sequencer = VerificationSequencer::new(RecordingVerifier::default());

    assert!(
        verify_package(&sequencer, &store, &packages::v3_core(), &bsc_testnet())
            .await
            .is_err()
    );
    assert!(sequencer.verifier().seen.lock().expect("seen lock").is_empty());
}
