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

use fastrace_opentelemetry::OpenTelemetryReporter;
use logforth::{
    append::{self, FastraceEvent},
    diagnostic::FastraceDiagnostic,
    filter::env_filter::EnvFilterBuilder,
    layout::JsonLayout,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::{ExporterBuildError, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use serde::Deserialize;
use std::{borrow::Cow, net::IpAddr};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "tracing")]
    pub tracing_config: TracingConfig,

    #[serde(rename = "metrics")]
    pub metrics_config: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    pub enabled: bool,
    pub service_name: String,
    pub otlp_exporter_endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: IpAddr,
    pub port: u16,
}

/// Initialize logging: JSON records on stdout, filtered via `RUST_LOG` (defaults to `info`);
/// records are also attached as events to the current fastrace span, if any.
pub fn init_logging() {
    logforth::starter_log::builder()
        .dispatch(|d| {
            d.filter(EnvFilterBuilder::from_default_env_or("info").build())
                .diagnostic(FastraceDiagnostic::default())
                .append(append::Stdout::default().with_layout(JsonLayout::default()))
        })
        .dispatch(|d| {
            d.filter(EnvFilterBuilder::from_default_env_or("info").build())
                .append(FastraceEvent::default())
        })
        .apply();
}

/// Initialize tracing: if enabled, fastrace spans are reported to the configured OTLP endpoint.
pub fn init_tracing(config: TracingConfig) -> Result<(), TelemetryError> {
    let TracingConfig {
        enabled,
        service_name,
        otlp_exporter_endpoint,
    } = config;

    if enabled {
        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(otlp_exporter_endpoint)
            .build()?;
        let resource = Resource::builder().with_service_name(service_name).build();
        let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        let reporter = OpenTelemetryReporter::new(exporter, Cow::Owned(resource), scope);

        fastrace::set_reporter(reporter, fastrace::collector::Config::default());
    }

    Ok(())
}

/// Initialize metrics: if enabled, a Prometheus exporter serves all metrics recorded via the
/// `metrics` facade on the configured address and port.
pub fn init_metrics(config: MetricsConfig) -> Result<(), TelemetryError> {
    let MetricsConfig {
        enabled,
        address,
        port,
    } = config;

    if enabled {
        PrometheusBuilder::new()
            .with_http_listener((address, port))
            .install()?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("cannot create OTLP span exporter")]
    SpanExporter(#[from] ExporterBuildError),

    #[error("cannot install Prometheus exporter")]
    Prometheus(#[from] BuildError),
}
