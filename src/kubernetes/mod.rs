// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, readiness checks, and namespace cleanup.

pub mod client;
pub mod namespaces;
pub mod checks;

pub use client::create_client;
pub use namespaces::delete_namespace;
