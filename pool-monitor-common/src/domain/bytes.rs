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

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};
use thiserror::Error;

/// Fixed-size byte array, e.g. a public key, an address or withdrawal credentials. Its textual
/// representation is `0x`-prefixed hex; parsing accepts the prefix as optional.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteArray<const N: usize>(pub [u8; N]);

impl<const N: usize> ByteArray<N> {
    pub fn to_hex(&self) -> String {
        const_hex::encode_prefixed(self.0)
    }
}

impl<const N: usize> Debug for ByteArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl<const N: usize> Display for ByteArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl<const N: usize> FromStr for ByteArray<N> {
    type Err = ByteArrayFromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        let bytes = const_hex::decode_to_array::<_, N>(hex)?;
        Ok(Self(bytes))
    }
}

impl<const N: usize> TryFrom<String> for ByteArray<N> {
    type Error = ByteArrayFromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl<const N: usize> From<ByteArray<N>> for String {
    fn from(bytes: ByteArray<N>) -> Self {
        bytes.to_hex()
    }
}

#[derive(Debug, Error)]
#[error("cannot hex-decode byte array")]
pub struct ByteArrayFromHexError(#[from] const_hex::FromHexError);

#[cfg(test)]
mod tests {
    use crate::domain::ByteArray;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse() {
        let bytes = "0x0102".parse::<ByteArray<2>>();
        assert_matches!(bytes, Ok(ByteArray([1, 2])));

        let bytes = "0102".parse::<ByteArray<2>>();
        assert_matches!(bytes, Ok(ByteArray([1, 2])));

        let bytes = "0x010203".parse::<ByteArray<2>>();
        assert!(bytes.is_err());

        let bytes = "0xzz02".parse::<ByteArray<2>>();
        assert!(bytes.is_err());
    }

    #[test]
    fn test_display() {
        let bytes = ByteArray([0xab, 0x01, 0xff]);
        assert_eq!(bytes.to_string(), "0xab01ff");
        assert_eq!(format!("{bytes:?}"), "0xab01ff");
    }

    #[test]
    fn test_serde() {
        let bytes = serde_json::from_str::<Vec<ByteArray<2>>>(r#"["0x0102", "ff00"]"#)
            .expect("byte arrays can be deserialized");
        assert_eq!(bytes, vec![ByteArray([1, 2]), ByteArray([0xff, 0])]);

        let json = serde_json::to_string(&bytes).expect("byte arrays can be serialized");
        assert_eq!(json, r#"["0x0102","0xff00"]"#);
    }
}
