// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Static per-network parameters. The table is built once per run and the
//! resolved record is handed to every component by reference.

use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::{Address, address};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no config found for network {network}")]
    NotFound { network: String },
    #[error("network {network} has no {field} configured")]
    FieldMissing { network: String, field: ConfigField },
}

/// Address-valued fields a deployment step may pull from the network config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigField {
    WrappedNative,
    Cake,
}

impl ConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WrappedNative => "WNATIVE",
            Self::Cake => "cake",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Etherscan-compatible explorer endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub api_url: String,
    pub browser_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub wnative: Option<Address>,
    pub cake: Option<Address>,
    pub explorer: Option<ExplorerConfig>,
}

impl NetworkConfig {
    /// Returns the configured address for `field`. A field left unset never
    /// falls back to the zero address.
    pub fn field(&self, field: ConfigField) -> Result<Address, ConfigError> {
        let value = match field {
            ConfigField::WrappedNative => self.wnative,
            ConfigField::Cake => self.cake,
        };
        value.ok_or_else(|| ConfigError::FieldMissing {
            network: self.name.clone(),
            field,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new(configs: impl IntoIterator<Item = NetworkConfig>) -> Self {
        Self {
            networks: configs
                .into_iter()
                .map(|config| (config.name.clone(), config))
                .collect(),
        }
    }

    /// The networks the protocol is deployed to.
    pub fn builtin() -> Self {
        Self::new([
            NetworkConfig {
                name: "eth".to_string(),
                chain_id: 1,
                wnative: Some(address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
                cake: Some(address!("0x152649eA73beAb28c5b49B26eb48f7EAD6d4c898")),
                explorer: Some(explorer(
                    "https://api.etherscan.io/api",
                    "https://etherscan.io",
                )),
            },
            NetworkConfig {
                name: "goerli".to_string(),
                chain_id: 5,
                wnative: Some(address!("0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6")),
                cake: Some(address!("0xc2C3eAbE0368a2Ea97f485b03D1098cdD7d0c081")),
                explorer: Some(explorer(
                    "https://api-goerli.etherscan.io/api",
                    "https://goerli.etherscan.io",
                )),
            },
            NetworkConfig {
                name: "bscMainnet".to_string(),
                chain_id: 56,
                wnative: Some(address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c")),
                cake: Some(address!("0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82")),
                explorer: Some(explorer(
                    "https://api.bscscan.com/api",
                    "https://bscscan.com",
                )),
            },
            NetworkConfig {
                name: "bscTestnet".to_string(),
                chain_id: 97,
                wnative: Some(address!("0xae13d989daC2f0dEbFf460aC112a837C89BAa7cd")),
                cake: Some(address!("0xFa60D973F7642B748046464e165A65B7323b0DEE")),
                explorer: Some(explorer(
                    "https://api-testnet.bscscan.com/api",
                    "https://testnet.bscscan.com",
                )),
            },
            NetworkConfig {
                name: "arb_sepolia".to_string(),
                chain_id: 421_614,
                wnative: Some(address!("0x980B62Da83eFf3D4576C647993b0c1D7faf17c73")),
                cake: None,
                explorer: Some(explorer(
                    "https://api-sepolia.arbiscan.io/api",
                    "https://sepolia.arbiscan.io",
                )),
            },
            // Local node: every dependency address has to come from a manifest.
            NetworkConfig {
                name: "hardhat".to_string(),
                chain_id: 31_337,
                wnative: None,
                cake: None,
                explorer: None,
            },
        ])
    }

    pub fn resolve(&self, network: &str) -> Result<NetworkConfig, ConfigError> {
        self.networks
            .get(network)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                network: network.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

fn explorer(api_url: &str, browser_url: &str) -> ExplorerConfig {
    ExplorerConfig {
        api_url: api_url.to_string(),
        browser_url: browser_url.to_string(),
    }
}
