/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

pub mod config;
pub mod form;
pub mod log;
pub mod opts;
pub mod serve;
pub mod signal;

mod build;
