// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context implementations.
//!
//! A context is whatever implements the [`crate::manager::adapters`] traits
//! the manager needs. Currently one implementation ships with the crate: the
//! [`memory::InMemoryContext`], which keeps everything behind in-process
//! locks and is used for testing and development.

pub mod memory;
