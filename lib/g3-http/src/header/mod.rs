/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod connection;
pub use connection::HttpConnectionOption;

mod params;
pub use params::HeaderParameters;
