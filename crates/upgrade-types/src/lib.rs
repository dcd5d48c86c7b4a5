// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0
#![warn(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    rust_2021_compatibility
)]

//! Contract upgrade transactions.
//!
//! An upgrade transaction migrates a set of ledger states governed by one contract to a new
//! contract. It exists in three forms:
//!
//! - [`UnresolvedUpgradeTransaction`](transaction::UnresolvedUpgradeTransaction): the wire form,
//!   holding only references and attachment ids.
//! - [`FilteredUpgradeTransaction`](transaction::FilteredUpgradeTransaction): the projection shown
//!   to non-validating notaries.
//! - [`ResolvedUpgradeTransaction`](transaction::ResolvedUpgradeTransaction): the verified form.
//!   A value of this type only exists if every upgrade rule has been checked.

#[macro_use]
pub mod error;

pub mod attachment;
pub mod base_types;
pub mod config;
pub mod constraints;
pub mod crypto;
pub mod digests;
pub mod network_parameters;
pub mod state;
pub mod storage;
pub mod transaction;
pub mod upgrade;
pub mod upgrade_serde;

#[cfg(test)]
#[path = "unit_tests/utils.rs"]
pub mod test_utils;
