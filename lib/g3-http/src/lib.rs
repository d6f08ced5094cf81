/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod parse;
pub use parse::*;

pub mod body;
pub mod header;
pub mod multipart;
pub mod server;

pub use body::{HttpBodyReader, HttpBodyType};
