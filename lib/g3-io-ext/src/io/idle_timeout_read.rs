/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::{Instant, Sleep};

pin_project! {
    /// A reader that fails with `TimedOut` if no data arrives within the idle timeout
    pub struct IdleTimeoutReader<R> {
        #[pin]
        inner: R,
        delay: Pin<Box<Sleep>>,
        timeout: Duration,
        timed_out: bool,
    }
}

impl<R> IdleTimeoutReader<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        IdleTimeoutReader {
            inner,
            delay: Box::pin(tokio::time::sleep(timeout)),
            timeout,
            timed_out: false,
        }
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    #[inline]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

impl<R> AsyncRead for IdleTimeoutReader<R>
where
    R: AsyncRead,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = self.project();
        if *me.timed_out {
            return Poll::Ready(Err(io::ErrorKind::TimedOut.into()));
        }
        match me.inner.poll_read(cx, buf) {
            Poll::Ready(r) => {
                me.delay.as_mut().reset(Instant::now() + *me.timeout);
                Poll::Ready(r)
            }
            Poll::Pending => {
                ready!(me.delay.as_mut().poll(cx));
                *me.timed_out = true;
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "no data received within the idle timeout",
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn stalled_peer() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut reader = IdleTimeoutReader::new(client, Duration::from_millis(100));

        server.write_all(b"ab").await.unwrap();
        let mut buf = [0u8; 8];
        let nr = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..nr], b"ab");
        assert!(!reader.timed_out());

        let e = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::TimedOut);
        assert!(reader.timed_out());

        // data arriving later will not be read any more
        server.write_all(b"cd").await.unwrap();
        let e = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn steady_peer() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut reader = IdleTimeoutReader::new(client, Duration::from_millis(200));

        let writer = tokio::spawn(async move {
            for _ in 0..4 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                server.write_all(b"x").await.unwrap();
            }
        });
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"xxxx");
        writer.await.unwrap();
    }
}
