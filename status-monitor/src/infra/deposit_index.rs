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

use crate::domain::{KeyRegistry, PoolIdentity, ValidatorKey};
use fastrace::trace;
use indoc::indoc;
use itertools::Itertools;
use log::debug;
use pool_monitor_common::domain::ByteArray;
use reqwest::Client as HttpClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use thiserror::Error;

const DEPOSITS_FROM_QUERY: &str = indoc! {"
    query DepositsFrom($first: Int!, $lastId: ID!, $values: [Bytes!]!) {
        deposits(
            first: $first
            orderBy: id
            orderDirection: asc
            where: { id_gt: $lastId, from_in: $values }
        ) {
            id
            pubkey
        }
    }
"};

const DEPOSITS_WITH_CREDENTIALS_QUERY: &str = indoc! {"
    query DepositsWithCredentials($first: Int!, $lastId: ID!, $values: [Bytes!]!) {
        deposits(
            first: $first
            orderBy: id
            orderDirection: asc
            where: { id_gt: $lastId, withdrawal_credentials_in: $values }
        ) {
            id
            pubkey
        }
    }
"};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// GraphQL endpoint of the deposit index, e.g. a subgraph of the deposit contract events.
    pub url: String,

    /// Optional API key, sent as bearer token.
    pub api_key: Option<SecretString>,

    /// Number of deposits per page.
    pub page_size: NonZeroUsize,
}

/// [KeyRegistry] implementation based on a GraphQL index of the deposit contract events.
#[derive(Debug, Clone)]
pub struct DepositIndex {
    http: HttpClient,
    url: String,
    api_key: Option<SecretString>,
    page_size: NonZeroUsize,
    pool_identity: PoolIdentity,
}

impl DepositIndex {
    pub fn new(config: Config, pool_identity: PoolIdentity) -> Result<Self, DepositIndexError> {
        let Config {
            url,
            api_key,
            page_size,
        } = config;

        let http = HttpClient::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DepositIndexError::Client)?;

        Ok(Self {
            http,
            url,
            api_key,
            page_size,
            pool_identity,
        })
    }

    /// Keys of all deposits matching the given query and values, paging through the deposits by
    /// ascending ID.
    #[trace]
    async fn get_all_keys<const N: usize>(
        &self,
        query: &'static str,
        values: &[ByteArray<N>],
    ) -> Result<Vec<ValidatorKey>, DepositIndexError> {
        if values.is_empty() {
            return Ok(vec![]);
        }

        get_all_pages(self.page_size, |last_id| async move {
            self.get_deposits(query, values, &last_id).await
        })
        .await
    }

    async fn get_deposits<const N: usize>(
        &self,
        query: &'static str,
        values: &[ByteArray<N>],
        last_id: &str,
    ) -> Result<Vec<Deposit>, DepositIndexError> {
        let request = GraphQlRequest {
            query,
            variables: Variables {
                first: self.page_size.get(),
                last_id,
                values,
            },
        };

        let mut request = self.http.post(&self.url).json(&request);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse<DepositsData>>()
            .await?;

        response.into_data().map(|data| data.deposits)
    }
}

impl KeyRegistry for DepositIndex {
    type Error = DepositIndexError;

    async fn deposited_keys(&self) -> Result<Vec<ValidatorKey>, Self::Error> {
        let PoolIdentity {
            from_addresses,
            withdrawal_credentials,
        } = &self.pool_identity;

        let keys_from_addresses = self
            .get_all_keys(DEPOSITS_FROM_QUERY, from_addresses)
            .await?;
        let keys_with_credentials = self
            .get_all_keys(DEPOSITS_WITH_CREDENTIALS_QUERY, withdrawal_credentials)
            .await?;

        Ok(merge_keys(keys_from_addresses, keys_with_credentials))
    }
}

#[derive(Debug, Error)]
pub enum DepositIndexError {
    #[error("cannot create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("cannot get deposits from deposit index")]
    Request(#[from] reqwest::Error),

    #[error("deposit index returned errors: {0}")]
    GraphQl(String),

    #[error("deposit index returned neither data nor errors")]
    NoData,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a, const N: usize> {
    query: &'static str,
    variables: Variables<'a, N>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a, const N: usize> {
    first: usize,
    last_id: &'a str,
    values: &'a [ByteArray<N>],
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,

    #[serde(default)]
    errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T, DepositIndexError> {
        if !self.errors.is_empty() {
            let messages = self.errors.into_iter().map(|error| error.message).join("; ");
            return Err(DepositIndexError::GraphQl(messages));
        }

        self.data.ok_or(DepositIndexError::NoData)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DepositsData {
    deposits: Vec<Deposit>,
}

#[derive(Debug, Deserialize)]
struct Deposit {
    id: String,
    pubkey: ValidatorKey,
}

/// Keys of all deposits, requesting the deposits after the ID of the last deposit of the previous
/// page until a page is not full.
async fn get_all_pages<F, Fut>(
    page_size: NonZeroUsize,
    mut get_page: F,
) -> Result<Vec<ValidatorKey>, DepositIndexError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<Deposit>, DepositIndexError>>,
{
    let mut keys = vec![];
    let mut last_id = String::new();

    loop {
        let deposits = get_page(last_id.clone()).await?;
        let page_len = deposits.len();
        debug!(page_len, last_id:%; "got deposits");

        if let Some(deposit) = deposits.last() {
            last_id = deposit.id.clone();
        }
        keys.extend(deposits.into_iter().map(|deposit| deposit.pubkey));

        if page_len < page_size.get() {
            break;
        }
    }

    Ok(keys)
}

/// Keys of both sequences without duplicates, e.g. from top-up deposits, in first-seen order.
fn merge_keys(keys: Vec<ValidatorKey>, other_keys: Vec<ValidatorKey>) -> Vec<ValidatorKey> {
    keys.into_iter().chain(other_keys).unique().collect()
}
