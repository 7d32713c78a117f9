// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

mod aggregate;
mod geo;
mod market;
mod node;
mod score;
mod stats;

pub use aggregate::*;
pub use geo::*;
pub use market::*;
pub use node::*;
pub use score::*;
pub use stats::*;

use std::error::Error as StdError;

/// API abstraction.
#[trait_variant::make(Send)]
pub trait Api
where
    Self: 'static,
{
    type Error: StdError + Send + Sync + 'static;

    async fn serve(self) -> Result<(), Self::Error>;
}
