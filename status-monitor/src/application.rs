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

mod metrics;

use crate::{
    application::metrics::Metrics,
    domain::{
        BeaconNode, Classification, DepositorAddress, KeyRegistry, PoolIdentity, Snapshot,
        StatusSummary, ValidatorKey, WithdrawalCredentials, classify,
    },
};
use anyhow::{Context, bail};
use fastrace::{Span, future::FutureExt, prelude::SpanContext, trace};
use log::{error, info, warn};
use pool_monitor_common::error::StdErrorExt;
use serde::Deserialize;
use std::{collections::HashMap, error::Error as StdError, time::Duration};
use thiserror::Error;
use tokio::{
    select,
    signal::unix::Signal,
    time::{sleep, timeout},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pool_name: String,

    pub network: String,

    /// Addresses the pool deposits from.
    #[serde(default)]
    pub from_addresses: Vec<DepositorAddress>,

    /// Withdrawal credentials the pool deposits with.
    #[serde(default)]
    pub withdrawal_credentials: Vec<WithdrawalCredentials>,

    /// Deposit addresses of known pools by pool name, used if neither from addresses nor
    /// withdrawal credentials are given.
    #[serde(default)]
    pub known_pools: HashMap<String, Vec<DepositorAddress>>,

    /// Delay after a successful deposit refresh.
    #[serde(with = "humantime_serde")]
    pub deposit_refresh_interval: Duration,

    /// Delay after a failed deposit refresh.
    #[serde(with = "humantime_serde")]
    pub deposit_retry_delay: Duration,

    /// Delay after a successful status refresh.
    #[serde(with = "humantime_serde")]
    pub status_refresh_interval: Duration,

    /// Delay after a failed status refresh.
    #[serde(with = "humantime_serde")]
    pub status_retry_delay: Duration,

    /// Delay before the next status refresh while no deposited keys are available.
    #[serde(with = "humantime_serde")]
    pub not_ready_delay: Duration,

    /// Maximum duration of a call to the key registry or the beacon node.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Config {
    pub fn pool_identity(&self) -> PoolIdentity {
        let identity = PoolIdentity {
            from_addresses: self.from_addresses.clone(),
            withdrawal_credentials: self.withdrawal_credentials.clone(),
        };

        match self.known_pools.get(&self.pool_name) {
            Some(from_addresses) if identity.is_empty() => PoolIdentity {
                from_addresses: from_addresses.clone(),
                withdrawal_credentials: vec![],
            },
            _ => identity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_name.is_empty() {
            return Err(ConfigError::EmptyPoolName);
        }

        if self.pool_identity().is_empty() {
            return Err(ConfigError::NoPoolIdentity);
        }

        if self.deposit_retry_delay >= self.deposit_refresh_interval {
            return Err(ConfigError::RetryDelay {
                name: "deposit",
                delay: self.deposit_retry_delay,
                interval: self.deposit_refresh_interval,
            });
        }

        if self.status_retry_delay >= self.status_refresh_interval {
            return Err(ConfigError::RetryDelay {
                name: "status",
                delay: self.status_retry_delay,
                interval: self.status_refresh_interval,
            });
        }

        if self.status_refresh_interval >= self.deposit_refresh_interval {
            return Err(ConfigError::StatusRefreshInterval {
                status: self.status_refresh_interval,
                deposit: self.deposit_refresh_interval,
            });
        }

        if self.call_timeout >= self.status_refresh_interval {
            return Err(ConfigError::CallTimeout {
                call_timeout: self.call_timeout,
                interval: self.status_refresh_interval,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pool name must not be empty")]
    EmptyPoolName,

    #[error("either from addresses or withdrawal credentials must be given")]
    NoPoolIdentity,

    #[error("{name} retry delay {delay:?} must be shorter than refresh interval {interval:?}")]
    RetryDelay {
        name: &'static str,
        delay: Duration,
        interval: Duration,
    },

    #[error(
        "status refresh interval {status:?} must be shorter than deposit refresh interval \
         {deposit:?}"
    )]
    StatusRefreshInterval { status: Duration, deposit: Duration },

    #[error("call timeout {call_timeout:?} must be shorter than refresh interval {interval:?}")]
    CallTimeout {
        call_timeout: Duration,
        interval: Duration,
    },
}

/// State shared between the deposit refresh, the status refresh and further readers.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Keys deposited for the pool, published by the deposit refresh.
    pub deposited_keys: Snapshot<Vec<ValidatorKey>>,

    /// Status summary and validating keys, published by the status refresh.
    pub classification: Snapshot<Classification>,
}

/// Error of a call to a collaborator, i.e. the key registry or the beacon node.
#[derive(Debug, Error)]
pub enum CallError<E>
where
    E: StdError + 'static,
{
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("call failed")]
    Failed(#[source] E),

    #[error("expected {expected} statuses, but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub async fn run(
    config: Config,
    registry: impl KeyRegistry,
    beacon: impl BeaconNode,
    state: State,
    mut sigterm: Signal,
) -> anyhow::Result<()> {
    config.validate().context("validate application config")?;

    let metrics = Metrics::new(&config.pool_name, &config.network);
    let pool_name = config.pool_name.as_str();
    let network = config.network.as_str();
    info!(pool_name:%, network:%; "starting to monitor validators");

    let refresh_deposits_task = refresh_deposits_loop(&config, &registry, &state);
    let refresh_statuses_task = refresh_statuses_loop(&config, &beacon, &state, &metrics);

    // Both loops run until the process terminates; dropping them on SIGTERM cancels them at their
    // current await point.
    select! {
        _ = refresh_deposits_task => bail!("refresh_deposits_task completed"),

        _ = refresh_statuses_task => bail!("refresh_statuses_task completed"),

        _ = sigterm.recv() => {
            warn!("SIGTERM received");
            Ok(())
        }
    }
}

async fn refresh_deposits_loop(config: &Config, registry: &impl KeyRegistry, state: &State) {
    loop {
        let result = refresh_deposits(registry, config.call_timeout, &state.deposited_keys)
            .in_span(Span::root("refresh-deposits", SpanContext::random()))
            .await;

        let delay = match result {
            Ok(deposited_validators) => {
                info!(deposited_validators; "deposits refreshed");
                config.deposit_refresh_interval
            }

            Err(error) => {
                error!(error:% = error.as_chain(); "cannot refresh deposits");
                config.deposit_retry_delay
            }
        };

        sleep(delay).await;
    }
}

/// Replace the deposited keys with the ones from the given registry and return their number. On
/// error the deposited keys are left untouched.
#[trace]
async fn refresh_deposits<R>(
    registry: &R,
    call_timeout: Duration,
    deposited_keys: &Snapshot<Vec<ValidatorKey>>,
) -> Result<usize, CallError<R::Error>>
where
    R: KeyRegistry,
{
    let keys = timeout(call_timeout, registry.deposited_keys())
        .await
        .map_err(|_| CallError::Timeout(call_timeout))?
        .map_err(CallError::Failed)?;

    let count = keys.len();
    deposited_keys.publish(keys);

    Ok(count)
}

async fn refresh_statuses_loop(
    config: &Config,
    beacon: &impl BeaconNode,
    state: &State,
    metrics: &Metrics,
) {
    loop {
        let result = refresh_statuses(beacon, config.call_timeout, state, metrics)
            .in_span(Span::root("refresh-statuses", SpanContext::random()))
            .await;

        let delay = match result {
            Ok(Some(summary)) => {
                let StatusSummary {
                    unknown,
                    deposited,
                    pending,
                    active,
                    exiting,
                    slashing,
                    exited,
                    invalid,
                    partially_deposited,
                    validating,
                } = summary;
                info!(
                    validating,
                    unknown,
                    deposited,
                    pending,
                    active,
                    exiting,
                    slashing,
                    exited,
                    invalid,
                    partially_deposited;
                    "validator statuses refreshed"
                );

                config.status_refresh_interval
            }

            Ok(None) => {
                warn!("no deposited keys available yet");
                config.not_ready_delay
            }

            Err(error) => {
                error!(error:% = error.as_chain(); "cannot refresh validator statuses");
                config.status_retry_delay
            }
        };

        sleep(delay).await;
    }
}

/// Classify the statuses of the deposited keys, publish the classification and update the
/// metrics. Returns `None` without calling the beacon node if there are no deposited keys yet. On
/// error the last classification and the metrics are left untouched.
#[trace]
async fn refresh_statuses<B>(
    beacon: &B,
    call_timeout: Duration,
    state: &State,
    metrics: &Metrics,
) -> Result<Option<StatusSummary>, CallError<B::Error>>
where
    B: BeaconNode,
{
    let Some(keys) = state.deposited_keys.load().filter(|keys| !keys.is_empty()) else {
        return Ok(None);
    };

    let statuses = timeout(call_timeout, beacon.statuses(&keys))
        .await
        .map_err(|_| CallError::Timeout(call_timeout))?
        .map_err(CallError::Failed)?;

    if statuses.len() != keys.len() {
        return Err(CallError::LengthMismatch {
            expected: keys.len(),
            actual: statuses.len(),
        });
    }

    let classification = state.classification.publish(classify(&keys, &statuses));
    metrics.update(&classification.summary);

    Ok(Some(classification.summary))
}
