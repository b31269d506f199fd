// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::time::Duration;

use alloy_primitives::hex;
use deploy_core::network::{ExplorerConfig, NetworkConfig};
use deploy_core::plan::encode_constructor_args;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{VerificationRequest, VerificationStatus, Verifier, VerifyError};
use crate::artifacts::ArtifactStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_POLLS: u32 = 24;

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Submission {
    Queued { guid: String },
    AlreadyVerified,
    Rejected { reason: String },
}

#[derive(Debug, PartialEq, Eq)]
enum CheckStatus {
    Pending,
    Done(VerificationStatus),
    Rejected { reason: String },
}

/// Verifier for Etherscan-compatible explorer APIs (etherscan, bscscan,
/// arbiscan). Uploads the standard-JSON compiler input from Hardhat's
/// build-info and polls until the explorer decides.
pub struct EtherscanVerifier {
    client: Client,
    api_url: String,
    api_key: String,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    max_polls: u32,
}

impl EtherscanVerifier {
    pub fn new(
        explorer: &ExplorerConfig,
        api_key: impl Into<String>,
        artifacts: ArtifactStore,
    ) -> Result<Self, VerifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: explorer.api_url.clone(),
            api_key: api_key.into(),
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    pub fn for_network(
        config: &NetworkConfig,
        api_key: impl Into<String>,
        artifacts: ArtifactStore,
    ) -> Result<Self, VerifyError> {
        let explorer = config
            .explorer
            .as_ref()
            .ok_or_else(|| VerifyError::Unsupported {
                network: config.name.clone(),
            })?;
        Self::new(explorer, api_key, artifacts)
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, VerifyError> {
        let artifact = self.artifacts.load(&request.contract)?;
        let build_info = self.artifacts.build_info(&request.contract)?;

        let mut input = build_info.input;
        if !request.libraries.is_empty() {
            let libraries = artifact.library_settings(&request.libraries)?;
            declare_libraries(&mut input, serde_json::to_value(libraries)?, &request.contract)?;
        }

        let form = [
            ("apikey", self.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("sourceCode", serde_json::to_string(&input)?),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", artifact.fully_qualified_name()),
            ("compilerversion", format!("v{}", build_info.solc_long_version)),
            // Field name is misspelled in the explorer API.
            (
                "constructorArguements",
                hex::encode(encode_constructor_args(&request.args)),
            ),
        ];

        let response: EtherscanResponse = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(name = %request.name, status = %response.status, message = %response.message, "submission answered");
        Ok(classify_submission(response))
    }

    async fn check(&self, guid: &str) -> Result<CheckStatus, VerifyError> {
        let response: EtherscanResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(classify_status(response))
    }
}

impl Verifier for EtherscanVerifier {
    async fn verify_contract(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationStatus, VerifyError> {
        let guid = match self.submit(request).await? {
            Submission::Queued { guid } => guid,
            Submission::AlreadyVerified => return Ok(VerificationStatus::AlreadyVerified),
            Submission::Rejected { reason } => return Err(VerifyError::Rejected { reason }),
        };

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            match self.check(&guid).await? {
                CheckStatus::Pending => {
                    debug!(name = %request.name, %guid, attempt, "verification pending");
                }
                CheckStatus::Done(status) => return Ok(status),
                CheckStatus::Rejected { reason } => return Err(VerifyError::Rejected { reason }),
            }
        }
        Err(VerifyError::Timeout {
            guid,
            attempts: self.max_polls,
        })
    }
}

/// Sets `settings.libraries` of a standard-JSON input, creating `settings`
/// when the input has none.
fn declare_libraries(
    input: &mut Value,
    libraries: Value,
    contract: &str,
) -> Result<(), VerifyError> {
    let invalid = || VerifyError::InvalidCompilerInput {
        contract: contract.to_string(),
    };
    let settings = input
        .as_object_mut()
        .ok_or_else(invalid)?
        .entry("settings")
        .or_insert_with(|| Value::Object(Default::default()))
        .as_object_mut()
        .ok_or_else(invalid)?;
    settings.insert("libraries".to_string(), libraries);
    Ok(())
}

fn is_already_verified(text: &str) -> bool {
    text.to_ascii_lowercase().contains("already verified")
}

fn classify_submission(response: EtherscanResponse) -> Submission {
    if response.status == "1" {
        Submission::Queued {
            guid: response.result,
        }
    } else if is_already_verified(&response.result) {
        Submission::AlreadyVerified
    } else {
        Submission::Rejected {
            reason: response.result,
        }
    }
}

fn classify_status(response: EtherscanResponse) -> CheckStatus {
    let result = response.result;
    if is_already_verified(&result) {
        CheckStatus::Done(VerificationStatus::AlreadyVerified)
    } else if result.to_ascii_lowercase().contains("pending") {
        CheckStatus::Pending
    } else if response.status == "1" || result.starts_with("Pass") {
        CheckStatus::Done(VerificationStatus::Verified)
    } else {
        CheckStatus::Rejected { reason: result }
    }
}
