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

mod snapshot;
mod status;

pub use snapshot::*;
pub use status::*;

use pool_monitor_common::domain::ByteArray;
use std::error::Error as StdError;

/// BLS public key of a validator.
pub type ValidatorKey = ByteArray<48>;

/// Execution layer address deposits are sent from.
pub type DepositorAddress = ByteArray<20>;

pub type WithdrawalCredentials = ByteArray<32>;

/// Identifies the validators of a pool: those deposited from any of the given addresses or with
/// any of the given withdrawal credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolIdentity {
    pub from_addresses: Vec<DepositorAddress>,
    pub withdrawal_credentials: Vec<WithdrawalCredentials>,
}

impl PoolIdentity {
    pub fn is_empty(&self) -> bool {
        self.from_addresses.is_empty() && self.withdrawal_credentials.is_empty()
    }
}

/// Source of the validator keys deposited for a pool.
#[trait_variant::make(Send)]
pub trait KeyRegistry
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// All keys deposited for the pool so far, i.e. a complete snapshot, not a delta.
    async fn deposited_keys(&self) -> Result<Vec<ValidatorKey>, Self::Error>;
}

/// Source of the current chain status of validators.
#[trait_variant::make(Send)]
pub trait BeaconNode
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// The status for each of the given keys, in the same order.
    async fn statuses(&self, keys: &[ValidatorKey]) -> Result<Vec<ReportedStatus>, Self::Error>;
}
