/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

mod error;
pub use error::HttpLineParseError;

mod header_line;
pub use header_line::HttpHeaderLine;

mod method_line;
pub use method_line::HttpMethodLine;

mod chunked_line;
pub use chunked_line::HttpChunkedLine;
