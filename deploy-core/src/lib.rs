// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Chain-independent deployment model.
//!
//! Flow: network config + external manifests -> plan -> resolved arguments.
//! Nothing in this crate talks to a chain or touches the filesystem.
pub mod manifest;
pub mod network;
pub mod plan;
pub mod verification;
