// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Hardhat compilation output: contract artifacts, library linking and the
//! build-info needed for source verification.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, hex};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const BUILD_INFO_DIR: &str = "build-info";
const DBG_SUFFIX: &str = ".dbg.json";
const ADDRESS_BYTES: usize = 20;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no artifact named {contract} under {}", .root.display())]
    NotFound { contract: String, root: PathBuf },
    #[error("artifact name {contract} is ambiguous: {candidates:?}")]
    Ambiguous {
        contract: String,
        candidates: Vec<PathBuf>,
    },
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact file {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{contract} has no creation bytecode (abstract contract or interface?)")]
    NotDeployable { contract: String },
    #[error("{contract} needs library {library}, which was not provided")]
    MissingLibrary { contract: String, library: String },
    #[error("{contract} does not reference library {library}")]
    UnexpectedLibrary { contract: String, library: String },
    #[error("link reference for {library} at byte {start} is outside the bytecode of {contract}")]
    LinkOutOfRange {
        contract: String,
        library: String,
        start: usize,
    },
    #[error("invalid bytecode hex in {contract}")]
    InvalidBytecode {
        contract: String,
        #[source]
        source: hex::FromHexError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LinkOffset {
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub bytecode: String,
    /// source name -> library name -> byte offsets in the creation code.
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>,
}

impl Artifact {
    /// `<source>:<Contract>`, the form explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Creation code with every library placeholder replaced. `libraries` may
    /// be keyed by plain or fully qualified library name; every referenced
    /// library must be supplied and nothing else may be.
    pub fn link(&self, libraries: &BTreeMap<String, Address>) -> Result<Vec<u8>, ArtifactError> {
        let code = self.bytecode.strip_prefix("0x").unwrap_or(&self.bytecode);
        if code.is_empty() {
            return Err(ArtifactError::NotDeployable {
                contract: self.contract_name.clone(),
            });
        }

        let mut code = code.to_string();
        let mut used = BTreeSet::new();
        for (source, refs) in &self.link_references {
            for (library, offsets) in refs {
                let qualified = format!("{source}:{library}");
                let (key, address) = libraries
                    .get_key_value(library.as_str())
                    .or_else(|| libraries.get_key_value(qualified.as_str()))
                    .ok_or_else(|| ArtifactError::MissingLibrary {
                        contract: self.contract_name.clone(),
                        library: library.clone(),
                    })?;
                used.insert(key.as_str());

                let replacement = hex::encode(address.as_slice());
                for offset in offsets {
                    let from = offset.start * 2;
                    let to = from + offset.length * 2;
                    if offset.length != ADDRESS_BYTES || to > code.len() {
                        return Err(ArtifactError::LinkOutOfRange {
                            contract: self.contract_name.clone(),
                            library: library.clone(),
                            start: offset.start,
                        });
                    }
                    code.replace_range(from..to, &replacement);
                }
            }
        }

        if let Some(extra) = libraries.keys().find(|key| !used.contains(key.as_str())) {
            return Err(ArtifactError::UnexpectedLibrary {
                contract: self.contract_name.clone(),
                library: extra.clone(),
            });
        }

        hex::decode(&code).map_err(|source| ArtifactError::InvalidBytecode {
            contract: self.contract_name.clone(),
            source,
        })
    }

    /// `settings.libraries` section of a standard-JSON input: source name ->
    /// library name -> address, for every library this contract links.
    pub fn library_settings(
        &self,
        libraries: &BTreeMap<String, Address>,
    ) -> Result<BTreeMap<String, BTreeMap<String, Address>>, ArtifactError> {
        let mut settings: BTreeMap<String, BTreeMap<String, Address>> = BTreeMap::new();
        for (source, refs) in &self.link_references {
            for library in refs.keys() {
                let qualified = format!("{source}:{library}");
                let address = libraries
                    .get(library.as_str())
                    .or_else(|| libraries.get(qualified.as_str()))
                    .ok_or_else(|| ArtifactError::MissingLibrary {
                        contract: self.contract_name.clone(),
                        library: library.clone(),
                    })?;
                settings
                    .entry(source.clone())
                    .or_default()
                    .insert(library.clone(), *address);
            }
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard-JSON compiler input, submitted verbatim for verification.
    pub input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// Index of one Hardhat `artifacts/` directory by contract name.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    index: BTreeMap<String, Vec<PathBuf>>,
}

impl ArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let root = root.into();
        let mut index = BTreeMap::new();
        index_dir(&root, &mut index)?;
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self, contract: &str) -> Result<Artifact, ArtifactError> {
        read_json(self.locate(contract)?)
    }

    pub fn build_info(&self, contract: &str) -> Result<BuildInfo, ArtifactError> {
        let artifact_path = self.locate(contract)?;
        let dbg_path = artifact_path.with_file_name(format!("{contract}{DBG_SUFFIX}"));
        let debug: DebugFile = read_json(&dbg_path)?;
        let dir = dbg_path.parent().unwrap_or(self.root.as_path());
        read_json(&dir.join(debug.build_info))
    }

    fn locate(&self, contract: &str) -> Result<&Path, ArtifactError> {
        match self.index.get(contract).map(Vec::as_slice) {
            Some([path]) => Ok(path.as_path()),
            Some(candidates) if !candidates.is_empty() => Err(ArtifactError::Ambiguous {
                contract: contract.to_string(),
                candidates: candidates.to_vec(),
            }),
            _ => Err(ArtifactError::NotFound {
                contract: contract.to_string(),
                root: self.root.clone(),
            }),
        }
    }
}

fn index_dir(dir: &Path, index: &mut BTreeMap<String, Vec<PathBuf>>) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() {
            if file_name != BUILD_INFO_DIR {
                index_dir(&path, index)?;
            }
            continue;
        }
        if file_name.ends_with(DBG_SUFFIX) {
            continue;
        }
        if let Some(contract) = file_name.strip_suffix(".json") {
            index.entry(contract.to_string()).or_default().push(path);
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const HELPER_SOURCE: &str = "contracts/libraries/SmartRouterHelper.sol";

    fn linked_artifact() -> Artifact {
        // 4 bytes of code, a 20-byte placeholder, 2 bytes of code.
        let placeholder = format!("__${}$__", "0".repeat(34));
        Artifact {
            contract_name: "QuoterV2".to_string(),
            source_name: "contracts/lens/QuoterV2.sol".to_string(),
            bytecode: format!("0x60806040{placeholder}5b00"),
            link_references: BTreeMap::from([(
                HELPER_SOURCE.to_string(),
                BTreeMap::from([(
                    "SmartRouterHelper".to_string(),
                    vec![LinkOffset {
                        start: 4,
                        length: 20,
                    }],
                )]),
            )]),
        }
    }

    #[test]
    fn link_splices_library_address_into_placeholder() {
        let helper = Address::repeat_byte(0xab);
        let code = linked_artifact()
            .link(&BTreeMap::from([("SmartRouterHelper".to_string(), helper)]))
            .expect("link");
        assert_eq!(code.len(), 26);
        assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
        assert_eq!(&code[4..24], helper.as_slice());
        assert_eq!(&code[24..], &[0x5b, 0x00]);
    }

    #[test]
    fn link_accepts_fully_qualified_library_name() {
        let key = format!("{HELPER_SOURCE}:SmartRouterHelper");
        let code = linked_artifact()
            .link(&BTreeMap::from([(key, Address::repeat_byte(0x01))]))
            .expect("link");
        assert_eq!(&code[4..24], Address::repeat_byte(0x01).as_slice());
    }

    #[test]
    fn library_settings_group_addresses_by_source() {
        let helper = Address::repeat_byte(0xab);
        let settings = linked_artifact()
            .library_settings(&BTreeMap::from([("SmartRouterHelper".to_string(), helper)]))
            .expect("settings");
        assert_eq!(
            settings.get(HELPER_SOURCE).and_then(|libs| libs.get("SmartRouterHelper")),
            Some(&helper)
        );
        assert!(matches!(
            linked_artifact().library_settings(&BTreeMap::new()),
            Err(ArtifactError::MissingLibrary { .. })
        ));
    }

    #[test]
    fn link_rejects_missing_and_unexpected_libraries() {
        assert!(matches!(
            linked_artifact().link(&BTreeMap::new()),
            Err(ArtifactError::MissingLibrary { ref library, .. }) if library == "SmartRouterHelper"
        ));

        let extra = BTreeMap::from([
            ("SmartRouterHelper".to_string(), Address::repeat_byte(0x01)),
            ("Oracle".to_string(), Address::repeat_byte(0x02)),
        ]);
        assert!(matches!(
            linked_artifact().link(&extra),
            Err(ArtifactError::UnexpectedLibrary { ref library, .. }) if library == "Oracle"
        ));
    }

    #[test]
    fn link_rejects_offsets_past_the_bytecode() {
        let mut artifact = linked_artifact();
        artifact.bytecode = "0x6080".to_string();
        assert!(matches!(
            artifact.link(&BTreeMap::from([(
                "SmartRouterHelper".to_string(),
                Address::ZERO
            )])),
            Err(ArtifactError::LinkOutOfRange { start: 4, .. })
        ));
    }

    #[test]
    fn link_rejects_interfaces() {
        let artifact = Artifact {
            contract_name: "IQuoter".to_string(),
            source_name: "contracts/interfaces/IQuoter.sol".to_string(),
            bytecode: "0x".to_string(),
            link_references: BTreeMap::new(),
        };
        assert!(matches!(
            artifact.link(&BTreeMap::new()),
            Err(ArtifactError::NotDeployable { .. })
        ));
    }

    fn write_json(path: &Path, value: serde_json::Value) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, serde_json::to_vec(&value).expect("encode")).expect("write");
    }

    #[test]
    fn store_indexes_artifacts_and_resolves_build_info() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path().join("artifacts");
        let source_dir = root.join("contracts/PancakeFactory.sol");
        write_json(
            &source_dir.join("PancakeFactory.json"),
            json!({
                "contractName": "PancakeFactory",
                "sourceName": "contracts/PancakeFactory.sol",
                "abi": [],
                "bytecode": "0x6001",
                "linkReferences": {}
            }),
        );
        write_json(
            &source_dir.join("PancakeFactory.dbg.json"),
            json!({ "buildInfo": "../../build-info/abc.json" }),
        );
        write_json(
            &root.join("build-info/abc.json"),
            json!({
                "solcLongVersion": "0.5.16+commit.9c3226ce",
                "input": { "language": "Solidity", "sources": {} },
                "output": {}
            }),
        );

        let store = ArtifactStore::open(&root).expect("open store");
        let artifact = store.load("PancakeFactory").expect("load");
        assert_eq!(artifact.fully_qualified_name(), "contracts/PancakeFactory.sol:PancakeFactory");
        assert_eq!(artifact.link(&BTreeMap::new()).expect("link"), vec![0x60, 0x01]);

        let build_info = store.build_info("PancakeFactory").expect("build info");
        assert_eq!(build_info.solc_long_version, "0.5.16+commit.9c3226ce");
        assert_eq!(build_info.input["language"], "Solidity");

        assert!(matches!(
            store.load("abc"),
            Err(ArtifactError::NotFound { .. })
        ));
        assert!(matches!(
            store.load("PancakeFactory.dbg"),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn store_reports_ambiguous_contract_names() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path().join("artifacts");
        let body = json!({
            "contractName": "Token",
            "sourceName": "x",
            "bytecode": "0x00"
        });
        write_json(&root.join("contracts/a/Token.sol/Token.json"), body.clone());
        write_json(&root.join("contracts/b/Token.sol/Token.json"), body);

        let store = ArtifactStore::open(&root).expect("open store");
        assert!(matches!(
            store.load("Token"),
            Err(ArtifactError::Ambiguous { ref candidates, .. }) if candidates.len() == 2
        ));
    }
}
