/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod fill_wait_data;
mod idle_timeout_read;
mod limited_read_until;
mod write_all_flush;

mod ext;
pub use ext::{LimitedBufReadExt, LimitedWriteExt};
pub use idle_timeout_read::IdleTimeoutReader;
