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

use std::{error::Error as StdError, fmt::Write};

/// Extension methods for types implementing [StdError].
pub trait StdErrorExt
where
    Self: StdError,
{
    /// Format this error and its chain of sources, separated by ": ".
    fn as_chain(&self) -> String {
        let mut chain = self.to_string();

        let mut source = self.source();
        while let Some(error) = source {
            let _ = write!(chain, ": {error}");
            source = error.source();
        }

        chain
    }
}

impl<T> StdErrorExt for T where T: StdError {}
