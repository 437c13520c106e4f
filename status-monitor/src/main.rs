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

#[tokio::main]
async fn main() {
    use log::error;
    use pool_monitor_common::telemetry;
    use std::panic;

    telemetry::init_logging();
    panic::set_hook(Box::new(|panic| error!(panic:%; "process panicked")));

    if let Err(error) = run().await {
        let backtrace = error.backtrace();
        let error = format!("{error:#}");
        error!(error, backtrace:%; "process exited with ERROR");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    use anyhow::Context;
    use log::info;
    use pool_monitor_common::{config::ConfigExt, telemetry};
    use status_monitor::{
        application::{self, State},
        config::Config,
        infra::{self, beacon_api::BeaconApi, deposit_index::DepositIndex},
    };
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm = signal(SignalKind::terminate()).context("register SIGTERM handler")?;
    let config = Config::load().context("load configuration")?;
    info!(config:?; "starting");
    let Config {
        application_config,
        infra_config,
        telemetry_config:
            telemetry::Config {
                tracing_config,
                metrics_config,
            },
    } = config;

    telemetry::init_tracing(tracing_config).context("initialize tracing")?;
    telemetry::init_metrics(metrics_config).context("initialize metrics")?;

    let infra::Config {
        deposit_index_config,
        beacon_api_config,
    } = infra_config;

    let deposit_index = DepositIndex::new(deposit_index_config, application_config.pool_identity())
        .context("create deposit index client")?;
    let beacon_api = BeaconApi::new(beacon_api_config).context("create beacon API client")?;

    let result = application::run(
        application_config,
        deposit_index,
        beacon_api,
        State::default(),
        sigterm,
    )
    .await
    .context("run status monitor application");

    fastrace::flush();
    result
}
