/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod error;
pub use error::MultipartError;

mod boundary;
pub use boundary::MultipartBoundary;

mod part;
pub use part::MultipartPartHeaders;

mod decoder;
pub use decoder::{
    MultipartDecodeConfig, MultipartDecoder, MultipartPartHandler, MultipartPartReader,
};
