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

use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, atomically replaceable value: readers always see a fully formed value, either the
/// one published last or none if nothing has been published yet.
#[derive(Debug)]
pub struct Snapshot<T>(Arc<RwLock<Option<Arc<T>>>>);

impl<T> Snapshot<T> {
    /// Replace the current value as a whole.
    pub fn publish(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self.0.write() = Some(value.clone());
        value
    }

    pub fn load(&self) -> Option<Arc<T>> {
        self.0.read().clone()
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(None)))
    }
}
