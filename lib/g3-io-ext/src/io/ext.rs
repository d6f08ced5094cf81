/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use tokio::io::{AsyncBufRead, AsyncWrite};

use super::fill_wait_data::FillWaitData;
use super::limited_read_until::LimitedReadUntil;
use super::write_all_flush::WriteAllFlush;

pub trait LimitedBufReadExt: AsyncBufRead {
    /// Read into `buf` until `delimiter` is found or `max_len` bytes have been read.
    ///
    /// Resolves to `(found, nr)`, where `nr` is the number of bytes appended to `buf`.
    /// `nr == 0` means the reader reached EOF before any byte was read.
    /// No more than `max_len` bytes will be consumed from the reader.
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }

    /// Wait until there is buffered data, resolves to `false` on EOF
    fn fill_wait_data(&mut self) -> FillWaitData<'_, Self>
    where
        Self: Unpin,
    {
        FillWaitData::new(self)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}

pub trait LimitedWriteExt: AsyncWrite {
    fn write_all_flush<'a>(&'a mut self, buf: &'a [u8]) -> WriteAllFlush<'a, Self>
    where
        Self: Unpin,
    {
        WriteAllFlush::new(self, buf)
    }
}

impl<W: AsyncWrite + ?Sized> LimitedWriteExt for W {}
