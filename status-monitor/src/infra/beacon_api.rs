// This file is part of pool-monitor.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::{BeaconNode, ReportedStatus, ValidatorKey, ValidatorStatus};
use fastrace::trace;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, num::NonZeroUsize};
use thiserror::Error;

const VALIDATORS_PATH: &str = "/eth/v1/beacon/states/head/validators";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the beacon node REST API, e.g. `http://localhost:5052`.
    pub url: String,

    /// Maximum number of keys per request.
    pub chunk_size: NonZeroUsize,
}

/// [BeaconNode] implementation based on the standard beacon node REST API.
#[derive(Debug, Clone)]
pub struct BeaconApi {
    http: HttpClient,
    validators_url: String,
    chunk_size: NonZeroUsize,
}

impl BeaconApi {
    pub fn new(config: Config) -> Result<Self, BeaconApiError> {
        let Config { url, chunk_size } = config;

        let http = HttpClient::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BeaconApiError::Client)?;
        let validators_url = format!("{}{VALIDATORS_PATH}", url.trim_end_matches('/'));

        Ok(Self {
            http,
            validators_url,
            chunk_size,
        })
    }

    #[trace]
    async fn get_validators(&self, keys: &[ValidatorKey]) -> Result<Vec<Validator>, BeaconApiError> {
        let response = self
            .http
            .post(&self.validators_url)
            .json(&ValidatorsRequest { ids: keys })
            .send()
            .await?
            .error_for_status()?
            .json::<ValidatorsResponse>()
            .await?;

        Ok(response.data)
    }
}

impl BeaconNode for BeaconApi {
    type Error = BeaconApiError;

    async fn statuses(&self, keys: &[ValidatorKey]) -> Result<Vec<ReportedStatus>, Self::Error> {
        let mut status_by_key = HashMap::with_capacity(keys.len());

        for chunk in keys.chunks(self.chunk_size.get()) {
            let validators = self.get_validators(chunk).await?;
            debug!(requested = chunk.len(), received = validators.len(); "got validators");

            status_by_key.extend(
                validators
                    .into_iter()
                    .map(|Validator { status, validator }| (validator.pubkey, status)),
            );
        }

        Ok(statuses_in_order(keys, &status_by_key))
    }
}

#[derive(Debug, Error)]
pub enum BeaconApiError {
    #[error("cannot create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("cannot get validators from beacon node")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ValidatorsRequest<'a> {
    ids: &'a [ValidatorKey],
}

#[derive(Debug, Deserialize)]
struct ValidatorsResponse {
    data: Vec<Validator>,
}

#[derive(Debug, Deserialize)]
struct Validator {
    status: String,
    validator: ValidatorData,
}

#[derive(Debug, Deserialize)]
struct ValidatorData {
    pubkey: ValidatorKey,
}

/// Statuses for the given keys in the same order. All keys come from the deposit registry, hence
/// keys not yet included in the beacon state are [ValidatorStatus::Deposited].
fn statuses_in_order(
    keys: &[ValidatorKey],
    status_by_key: &HashMap<ValidatorKey, String>,
) -> Vec<ReportedStatus> {
    keys.iter()
        .map(|key| {
            status_by_key
                .get(key)
                .map(|status| parse_status(status))
                .unwrap_or(ReportedStatus::Known(ValidatorStatus::Deposited))
        })
        .collect()
}

/// Map a status reported by a beacon node: the standard beacon API statuses as well as the
/// upper-case statuses of the v1alpha1 API are supported.
fn parse_status(status: &str) -> ReportedStatus {
    let status = match status {
        "pending_initialized" => ValidatorStatus::Deposited,
        "pending_queued" => ValidatorStatus::Pending,
        "active_ongoing" => ValidatorStatus::Active,
        "active_exiting" => ValidatorStatus::Exiting,
        "active_slashed" => ValidatorStatus::Slashing,
        "exited_unslashed" | "exited_slashed" | "withdrawal_possible" | "withdrawal_done" => {
            ValidatorStatus::Exited
        }

        "UNKNOWN_STATUS" => ValidatorStatus::Unknown,
        "DEPOSITED" => ValidatorStatus::Deposited,
        "PENDING" => ValidatorStatus::Pending,
        "ACTIVE" => ValidatorStatus::Active,
        "EXITING" => ValidatorStatus::Exiting,
        "SLASHING" => ValidatorStatus::Slashing,
        "EXITED" => ValidatorStatus::Exited,
        "INVALID" => ValidatorStatus::Invalid,
        "PARTIALLY_DEPOSITED" => ValidatorStatus::PartiallyDeposited,

        other => return ReportedStatus::Unrecognized(other.to_owned()),
    };

    ReportedStatus::Known(status)
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{ReportedStatus, ValidatorKey, ValidatorStatus},
        infra::beacon_api::{
            BeaconApi, Config, ValidatorsRequest, ValidatorsResponse, parse_status,
            statuses_in_order,
        },
    };
    use indoc::formatdoc;
    use pool_monitor_common::domain::ByteArray;
    use std::{collections::HashMap, num::NonZeroUsize};

    #[test]
    fn test_parse_status() {
        let cases = [
            ("pending_initialized", ValidatorStatus::Deposited),
            ("pending_queued", ValidatorStatus::Pending),
            ("active_ongoing", ValidatorStatus::Active),
            ("active_exiting", ValidatorStatus::Exiting),
            ("active_slashed", ValidatorStatus::Slashing),
            ("exited_slashed", ValidatorStatus::Exited),
            ("withdrawal_done", ValidatorStatus::Exited),
            ("PARTIALLY_DEPOSITED", ValidatorStatus::PartiallyDeposited),
            ("INVALID", ValidatorStatus::Invalid),
        ];
        for (status, expected) in cases {
            assert_eq!(parse_status(status), ReportedStatus::Known(expected));
        }

        assert_eq!(
            parse_status("active"),
            ReportedStatus::Unrecognized("active".to_owned())
        );
    }

    #[test]
    fn test_statuses_in_order() {
        let keys = [key(1), key(2), key(3)];
        let status_by_key = HashMap::from([
            (key(3), "active_ongoing".to_owned()),
            (key(1), "pending_queued".to_owned()),
            (key(42), "active_ongoing".to_owned()),
        ]);

        let statuses = statuses_in_order(&keys, &status_by_key);
        assert_eq!(
            statuses,
            vec![
                ValidatorStatus::Pending.into(),
                ValidatorStatus::Deposited.into(),
                ValidatorStatus::Active.into(),
            ]
        );
    }

    #[test]
    fn test_validators_response() {
        let json = formatdoc!(
            r#"
                {{
                  "execution_optimistic": false,
                  "finalized": false,
                  "data": [
                    {{
                      "index": "1",
                      "balance": "32000000000",
                      "status": "active_ongoing",
                      "validator": {{
                        "pubkey": "{}",
                        "withdrawal_credentials": "0x00",
                        "effective_balance": "32000000000",
                        "slashed": false
                      }}
                    }}
                  ]
                }}
            "#,
            key(7)
        );

        let response = serde_json::from_str::<ValidatorsResponse>(&json)
            .expect("validators response can be deserialized");
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].status, "active_ongoing");
        assert_eq!(response.data[0].validator.pubkey, key(7));
    }

    #[test]
    fn test_validators_request() {
        let keys = [key(1)];
        let json = serde_json::to_value(ValidatorsRequest { ids: &keys })
            .expect("validators request can be serialized");
        assert_eq!(json, serde_json::json!({ "ids": [format!("0x{}", "01".repeat(48))] }));
    }

    #[test]
    fn test_validators_url() {
        let beacon_api = BeaconApi::new(Config {
            url: "http://localhost:5052/".to_owned(),
            chunk_size: NonZeroUsize::MIN,
        })
        .expect("beacon API can be created");
        assert_eq!(
            beacon_api.validators_url,
            "http://localhost:5052/eth/v1/beacon/states/head/validators"
        );
    }

    fn key(n: u8) -> ValidatorKey {
        ByteArray([n; 48])
    }
}
