// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
