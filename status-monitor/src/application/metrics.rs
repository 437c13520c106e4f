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

use crate::domain::{StatusSummary, ValidatorStatus};
use metrics::{Gauge, gauge};

/// Gauges for the number of validators of the monitored pool per status.
pub struct Metrics {
    by_status: [Gauge; 9],
    validating: Gauge,
}

impl Metrics {
    pub fn new(pool_name: &str, network: &str) -> Self {
        let by_status = ValidatorStatus::ALL.map(|status| {
            gauge!(
                "pool_validators",
                "pool" => pool_name.to_owned(),
                "network" => network.to_owned(),
                "status" => status.as_str()
            )
        });
        let validating = gauge!(
            "pool_validators",
            "pool" => pool_name.to_owned(),
            "network" => network.to_owned(),
            "status" => "validating"
        );

        Self {
            by_status,
            validating,
        }
    }

    pub fn update(&self, summary: &StatusSummary) {
        for (status, gauge) in ValidatorStatus::ALL.into_iter().zip(&self.by_status) {
            gauge.set(summary.count(status) as f64);
        }
        self.validating.set(summary.validating as f64);
    }
}
