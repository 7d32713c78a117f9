// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use derive_more::{Deref, Display, Into};
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Network identifier, e.g. "devnet" or "mainnet".
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Deref, Into, Deserialize)]
#[deref(forward)]
#[serde(try_from = "String")]
pub struct Network(pub String);

impl TryFrom<String> for Network {
    type Error = InvalidNetworkError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(InvalidNetworkError::Empty)
        } else {
            Ok(Self(s))
        }
    }
}

impl TryFrom<&str> for Network {
    type Error = InvalidNetworkError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.to_owned().try_into()
    }
}

impl FromStr for Network {
    type Err = InvalidNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.try_into()
    }
}

#[derive(Debug, Error)]
pub enum InvalidNetworkError {
    #[error("network must not be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use crate::domain::Network;

    #[test]
    fn test_network_try_from() {
        assert!(Network::try_from("devnet").is_ok());
        assert!(Network::try_from("").is_err());
    }
}
