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

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::de::DeserializeOwned;
use std::env;

const CONFIG_FILE: &str = "CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";
const ENV_PREFIX: &str = "APP__";

/// Extension methods for configuration types.
pub trait ConfigExt
where
    Self: DeserializeOwned,
{
    /// Load the configuration from the YAML file at `$CONFIG_FILE` (defaults to `config.yaml`),
    /// overridden by environment variables prefixed with `APP__`, using `__` to separate nested
    /// keys, e.g. `APP__INFRA__BEACON__URL`.
    fn load() -> Result<Self, Box<figment::Error>> {
        let config_file =
            env::var(CONFIG_FILE).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());

        Figment::new()
            .merge(Yaml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }
}

impl<T> ConfigExt for T where T: DeserializeOwned {}

#[cfg(test)]
mod tests {
    use crate::config::ConfigExt;
    use figment::Jail;
    use indoc::indoc;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Deserialize)]
    struct Config {
        name: String,
        nested: Nested,
    }

    #[derive(Debug, Deserialize)]
    struct Nested {
        #[serde(with = "humantime_serde")]
        interval: Duration,
        port: u16,
    }

    #[test]
    fn test_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                indoc! {r#"
                    name: "foo"
                    nested:
                      interval: "10s"
                      port: 9500
                "#},
            )?;
            jail.set_env("APP__NESTED__PORT", "4242");

            let config = Config::load().map_err(|error| *error)?;
            assert_eq!(config.name, "foo");
            assert_eq!(config.nested.interval, Duration::from_secs(10));
            assert_eq!(config.nested.port, 4242);

            Ok(())
        });
    }

    #[test]
    fn test_load_config_file_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "other.yaml",
                indoc! {r#"
                    name: "bar"
                    nested:
                      interval: "1h"
                      port: 1
                "#},
            )?;
            jail.set_env("CONFIG_FILE", "other.yaml");

            let config = Config::load().map_err(|error| *error)?;
            assert_eq!(config.name, "bar");
            assert_eq!(config.nested.interval, Duration::from_secs(3_600));

            Ok(())
        });
    }
}
