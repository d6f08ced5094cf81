/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod error;
pub use error::{HttpRequestParseError, HttpResponseError};

mod request;
pub use request::{HttpRequestParseConfig, HttpServerRequest};

mod response;
pub use response::HttpResponseWriter;
