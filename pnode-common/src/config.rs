// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::de::DeserializeOwned;
use std::env;

const CONFIG_FILE_ENV: &str = "CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";
const ENV_PREFIX: &str = "APP__";
const ENV_SEPARATOR: &str = "__";

/// Extension methods for deserializable configurations.
pub trait ConfigExt
where
    Self: DeserializeOwned,
{
    /// Load the configuration from the YAML file at `CONFIG_FILE` (default `config.yaml`),
    /// overridden by `APP__` prefixed environment variables split on `__`.
    fn load() -> Result<Self, figment::Error> {
        let config_file =
            env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());

        Figment::new()
            .merge(Yaml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
            .extract()
    }
}

impl<T> ConfigExt for T where T: DeserializeOwned {}

#[cfg(test)]
mod tests {
    use crate::config::ConfigExt;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Config {
        name: String,
        api: ApiConfig,
    }

    #[derive(Debug, Deserialize)]
    struct ApiConfig {
        port: u16,
    }

    #[test]
    fn test_load() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "name: dashboard\napi:\n  port: 8088\n")?;

            let config = Config::load()?;
            assert_eq!(config.name, "dashboard");
            assert_eq!(config.api.port, 8088);

            jail.set_env("APP__API__PORT", "9099");
            let config = Config::load()?;
            assert_eq!(config.api.port, 9099);

            Ok(())
        });
    }
}
