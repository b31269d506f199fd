// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Deployment plans of the protocol's packages. A package id is also the
//! directory holding the package's `deployments/` manifests.

use alloy_primitives::Address;
use deploy_core::network::ConfigField;
use deploy_core::plan::{ArgSource, DeploymentPlan, DeploymentStep};

pub const V3_CORE: &str = "v3-core";
/// Deployed outside this tool; only its manifest is read.
pub const V3_PERIPHERY: &str = "v3-periphery";
pub const MASTERCHEF_V3: &str = "masterchef-v3";
pub const ROUTER: &str = "router";

/// Order used by `verify-all`: dependencies before dependents.
pub const VERIFY_ALL_ORDER: [&str; 3] = [V3_CORE, ROUTER, MASTERCHEF_V3];

/// Maps user input to a package id. The router is also published as
/// `smart-router`.
pub fn canonical(name: &str) -> Option<&'static str> {
    match name {
        V3_CORE => Some(V3_CORE),
        MASTERCHEF_V3 => Some(MASTERCHEF_V3),
        ROUTER | "smart-router" => Some(ROUTER),
        _ => None,
    }
}

pub fn plan(package: &str) -> Option<DeploymentPlan> {
    match canonical(package)? {
        V3_CORE => Some(v3_core()),
        MASTERCHEF_V3 => Some(masterchef_v3()),
        ROUTER => Some(router()),
        _ => None,
    }
}

pub fn v3_core() -> DeploymentPlan {
    DeploymentPlan::new(
        V3_CORE,
        vec![
            DeploymentStep::new("PancakeV3PoolDeployer"),
            DeploymentStep::new("PancakeV3Factory").arg(ArgSource::step("PancakeV3PoolDeployer")),
        ],
    )
}

pub fn masterchef_v3() -> DeploymentPlan {
    DeploymentPlan::new(
        MASTERCHEF_V3,
        vec![
            DeploymentStep::new("MasterChefV3")
                .arg(ArgSource::Config(ConfigField::Cake))
                .arg(ArgSource::external(V3_PERIPHERY, "NonfungiblePositionManager"))
                .arg(ArgSource::Config(ConfigField::WrappedNative)),
            DeploymentStep::new("StableSwapLPFactory").contract("PancakeStableSwapLPFactory"),
            DeploymentStep::new("StableSwapTwoPoolDeployer")
                .contract("PancakeStableSwapTwoPoolDeployer"),
            DeploymentStep::new("StableSwapThreePoolDeployer")
                .contract("PancakeStableSwapThreePoolDeployer"),
            DeploymentStep::new("StableSwapFactory")
                .contract("PancakeStableSwapFactory")
                .arg(ArgSource::step("StableSwapLPFactory"))
                .arg(ArgSource::step("StableSwapTwoPoolDeployer"))
                .arg(ArgSource::step("StableSwapThreePoolDeployer")),
            DeploymentStep::new("StableSwapInfo").contract("PancakeStableSwapTwoPoolInfo"),
        ],
    )
}

pub fn router() -> DeploymentPlan {
    let pool_deployer = || ArgSource::external(V3_CORE, "PancakeV3PoolDeployer");
    let v3_factory = || ArgSource::external(V3_CORE, "PancakeV3Factory");
    let position_manager = || ArgSource::external(V3_PERIPHERY, "NonfungiblePositionManager");
    let stable_factory = || ArgSource::external(MASTERCHEF_V3, "StableSwapFactory");
    let wnative = || ArgSource::Config(ConfigField::WrappedNative);
    let factory_v2 = || ArgSource::step("FactoryV2");

    DeploymentPlan::new(
        ROUTER,
        vec![
            // No fee handler.
            DeploymentStep::new("FactoryV2")
                .contract("PancakeFactory")
                .arg(ArgSource::Literal(Address::ZERO)),
            DeploymentStep::new("SmartRouterHelper"),
            DeploymentStep::new("SmartRouter")
                .arg(factory_v2())
                .arg(pool_deployer())
                .arg(v3_factory())
                .arg(position_manager())
                .arg(stable_factory())
                .arg(ArgSource::external(MASTERCHEF_V3, "StableSwapInfo"))
                .arg(wnative())
                .link("SmartRouterHelper"),
            DeploymentStep::new("MixedRouteQuoterV1")
                .arg(pool_deployer())
                .arg(v3_factory())
                .arg(factory_v2())
                .arg(stable_factory())
                .arg(wnative())
                .link("SmartRouterHelper"),
            DeploymentStep::new("QuoterV2")
                .arg(pool_deployer())
                .arg(v3_factory())
                .arg(wnative())
                .link("SmartRouterHelper"),
            DeploymentStep::new("TokenValidator")
                .arg(factory_v2())
                .arg(position_manager())
                .link("SmartRouterHelper"),
        ],
    )
}
