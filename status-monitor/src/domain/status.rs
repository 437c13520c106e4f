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

use crate::domain::ValidatorKey;
use log::warn;
use std::fmt::{self, Display};

/// Lifecycle status of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidatorStatus {
    Unknown,
    Deposited,
    Pending,
    Active,
    Exiting,
    Slashing,
    Exited,
    Invalid,
    PartiallyDeposited,
}

impl ValidatorStatus {
    pub const ALL: [Self; 9] = [
        Self::Unknown,
        Self::Deposited,
        Self::Pending,
        Self::Active,
        Self::Exiting,
        Self::Slashing,
        Self::Exited,
        Self::Invalid,
        Self::PartiallyDeposited,
    ];

    /// Whether a validator with this status has to perform duties, i.e. propose and attest.
    pub fn is_validating(self) -> bool {
        matches!(self, Self::Active | Self::Exiting | Self::Slashing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Deposited => "deposited",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Exiting => "exiting",
            Self::Slashing => "slashing",
            Self::Exited => "exited",
            Self::Invalid => "invalid",
            Self::PartiallyDeposited => "partially_deposited",
        }
    }
}

impl Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as reported by a beacon node, which might not be one we know of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Known(ValidatorStatus),
    Unrecognized(String),
}

impl From<ValidatorStatus> for ReportedStatus {
    fn from(status: ValidatorStatus) -> Self {
        Self::Known(status)
    }
}

/// Number of validators per status. The per-status counts are mutually exclusive, whereas
/// `validating` overlaps with `active`, `exiting` and `slashing`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub unknown: u64,
    pub deposited: u64,
    pub pending: u64,
    pub active: u64,
    pub exiting: u64,
    pub slashing: u64,
    pub exited: u64,
    pub invalid: u64,
    pub partially_deposited: u64,
    pub validating: u64,
}

impl StatusSummary {
    pub fn count(&self, status: ValidatorStatus) -> u64 {
        match status {
            ValidatorStatus::Unknown => self.unknown,
            ValidatorStatus::Deposited => self.deposited,
            ValidatorStatus::Pending => self.pending,
            ValidatorStatus::Active => self.active,
            ValidatorStatus::Exiting => self.exiting,
            ValidatorStatus::Slashing => self.slashing,
            ValidatorStatus::Exited => self.exited,
            ValidatorStatus::Invalid => self.invalid,
            ValidatorStatus::PartiallyDeposited => self.partially_deposited,
        }
    }

    /// Sum of the mutually exclusive per-status counts.
    pub fn total(&self) -> u64 {
        ValidatorStatus::ALL
            .into_iter()
            .map(|status| self.count(status))
            .sum()
    }

    fn count_mut(&mut self, status: ValidatorStatus) -> &mut u64 {
        match status {
            ValidatorStatus::Unknown => &mut self.unknown,
            ValidatorStatus::Deposited => &mut self.deposited,
            ValidatorStatus::Pending => &mut self.pending,
            ValidatorStatus::Active => &mut self.active,
            ValidatorStatus::Exiting => &mut self.exiting,
            ValidatorStatus::Slashing => &mut self.slashing,
            ValidatorStatus::Exited => &mut self.exited,
            ValidatorStatus::Invalid => &mut self.invalid,
            ValidatorStatus::PartiallyDeposited => &mut self.partially_deposited,
        }
    }
}

/// Outcome of classifying the statuses of a set of validators.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub summary: StatusSummary,

    /// Keys of the validating validators in the order they were classified.
    pub validating_keys: Vec<ValidatorKey>,
}

/// Count the given statuses and collect the keys of the validating validators. `keys` and
/// `statuses` correspond to each other by position and are expected to have the same length;
/// surplus elements of the longer one are ignored. Unrecognized statuses are logged and otherwise
/// ignored.
pub fn classify(keys: &[ValidatorKey], statuses: &[ReportedStatus]) -> Classification {
    let mut classification = Classification::default();

    for (key, status) in keys.iter().zip(statuses) {
        match status {
            ReportedStatus::Known(status) => {
                *classification.summary.count_mut(*status) += 1;

                if status.is_validating() {
                    classification.summary.validating += 1;
                    classification.validating_keys.push(*key);
                }
            }

            ReportedStatus::Unrecognized(status) => {
                warn!(key:%, status:%; "unrecognized validator status");
            }
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        ReportedStatus, StatusSummary, ValidatorKey, ValidatorStatus, ValidatorStatus::*,
        classify,
    };
    use pool_monitor_common::domain::ByteArray;

    #[test]
    fn test_classify() {
        let keys = keys(6);
        let statuses = vec![
            Deposited.into(),
            Active.into(),
            Exiting.into(),
            ReportedStatus::Unrecognized("weird".to_owned()),
            Slashing.into(),
            Exited.into(),
        ];

        let classification = classify(&keys, &statuses);

        assert_eq!(
            classification.summary,
            StatusSummary {
                deposited: 1,
                active: 1,
                exiting: 1,
                slashing: 1,
                exited: 1,
                validating: 3,
                ..Default::default()
            }
        );
        assert_eq!(
            classification.validating_keys,
            vec![keys[1], keys[2], keys[4]]
        );
    }

    #[test]
    fn test_classify_counts() {
        let inputs = [
            vec![],
            ValidatorStatus::ALL.map(ReportedStatus::Known).to_vec(),
            vec![
                Active.into(),
                Active.into(),
                ReportedStatus::Unrecognized("".to_owned()),
                Pending.into(),
                Unknown.into(),
                ReportedStatus::Unrecognized("ACTIVE_ONGOING".to_owned()),
                Invalid.into(),
                PartiallyDeposited.into(),
            ],
            vec![ReportedStatus::Unrecognized("weird".to_owned()); 3],
        ];

        for statuses in inputs {
            let keys = keys(statuses.len());
            let classification = classify(&keys, &statuses);

            let unrecognized = statuses
                .iter()
                .filter(|status| matches!(status, ReportedStatus::Unrecognized(_)))
                .count();
            assert_eq!(
                classification.summary.total(),
                (statuses.len() - unrecognized) as u64
            );

            let validating_keys = keys
                .iter()
                .zip(&statuses)
                .filter(|(_, status)| {
                    matches!(status, ReportedStatus::Known(status) if status.is_validating())
                })
                .map(|(key, _)| *key)
                .collect::<Vec<_>>();
            assert_eq!(classification.validating_keys, validating_keys);
            assert_eq!(
                classification.summary.validating,
                classification.validating_keys.len() as u64
            );
        }
    }

    #[test]
    fn test_classify_idempotent() {
        let keys = keys(5);
        let statuses = vec![
            Slashing.into(),
            Exited.into(),
            Active.into(),
            ReportedStatus::Unrecognized("weird".to_owned()),
            Exiting.into(),
        ];

        let first = classify(&keys, &statuses);
        let second = classify(&keys, &statuses);
        assert_eq!(first, second);
        assert_eq!(first.validating_keys, vec![keys[0], keys[2], keys[4]]);
    }

    #[test]
    fn test_classify_length_mismatch() {
        let keys = keys(3);
        let statuses: Vec<ReportedStatus> = vec![Pending.into(), Active.into(), Active.into()];

        let classification = classify(&keys[..2], &statuses);
        assert_eq!(classification.summary.total(), 2);
        assert_eq!(classification.validating_keys, vec![keys[1]]);

        let classification = classify(&keys, &statuses[..2]);
        assert_eq!(classification.summary.total(), 2);
        assert_eq!(classification.validating_keys, vec![keys[1]]);
    }

    #[test]
    fn test_is_validating() {
        let validating = ValidatorStatus::ALL
            .into_iter()
            .filter(|status| status.is_validating())
            .collect::<Vec<_>>();
        assert_eq!(validating, vec![Active, Exiting, Slashing]);
    }

    #[test]
    fn test_summary_count() {
        let summary = StatusSummary {
            unknown: 1,
            deposited: 2,
            pending: 3,
            active: 4,
            exiting: 5,
            slashing: 6,
            exited: 7,
            invalid: 8,
            partially_deposited: 9,
            validating: 15,
        };

        let counts = ValidatorStatus::ALL.map(|status| summary.count(status));
        assert_eq!(counts, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(summary.total(), 45);
    }

    fn keys(n: usize) -> Vec<ValidatorKey> {
        (0..n).map(|n| ByteArray([n as u8; 48])).collect()
    }
}
