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

pub mod beacon_api;
pub mod deposit_index;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "deposit_index")]
    pub deposit_index_config: deposit_index::Config,

    #[serde(rename = "beacon_api")]
    pub beacon_api_config: beacon_api::Config,
}
