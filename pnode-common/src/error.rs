// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

/// Boxed error for trait seams where concrete error types would leak implementation details.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
