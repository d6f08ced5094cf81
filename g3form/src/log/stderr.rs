/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use flume::{Receiver, Sender, TrySendError};
use slog::{Drain, Level, OwnedKVList, Record};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

struct StdLogValue {
    level: Level,
    message: String,
    location: String,
}

#[derive(Default)]
struct LogDropStats {
    channel_overflow: AtomicU64,
    channel_closed: AtomicU64,
    io_failed: AtomicU64,
}

pub(super) struct AsyncStderrLogger {
    sender: Sender<StdLogValue>,
    stats: Arc<LogDropStats>,
}

pub(super) fn new_async_logger(thread_name: &str, channel_capacity: usize) -> AsyncStderrLogger {
    let (sender, receiver) = flume::bounded::<StdLogValue>(channel_capacity);
    let stats = Arc::new(LogDropStats::default());

    let io_thread = AsyncIoThread {
        receiver,
        stats: Arc::clone(&stats),
    };
    let _detached_thread = std::thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || io_thread.run(io::stderr()));

    AsyncStderrLogger { sender, stats }
}

impl Drain for AsyncStderrLogger {
    type Ok = ();
    type Err = slog::Error;

    fn log(&self, record: &Record, _logger_values: &OwnedKVList) -> Result<(), slog::Error> {
        let v = StdLogValue {
            level: record.level(),
            message: record.msg().to_string(),
            location: format!("{}:{}", record.file(), record.line()),
        };
        match self.sender.try_send(v) {
            Ok(_) => {}
            Err(TrySendError::Full(_)) => {
                self.stats.channel_overflow.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.channel_closed.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

struct AsyncIoThread {
    receiver: Receiver<StdLogValue>,
    stats: Arc<LogDropStats>,
}

impl AsyncIoThread {
    fn run<IO: Write>(&self, mut io: IO) {
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Ok(v) = self.receiver.recv() {
            buf.clear();
            let _ = write_plain(&mut buf, v);
            self.write_buf(&mut io, &buf);

            while let Ok(v) = self.receiver.try_recv() {
                buf.clear();
                let _ = write_plain(&mut buf, v);
                self.write_buf(&mut io, &buf);
            }

            let _ = io.flush();
        }
    }

    fn write_buf<IO: Write>(&self, io: &mut IO, buf: &[u8]) {
        if io.write_all(buf).is_err() {
            self.stats.io_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn write_plain<IO: Write>(io: &mut IO, v: StdLogValue) -> io::Result<()> {
    let datetime = Local::now();
    write!(io, "{}", datetime.format(TIME_FORMAT))?;
    write!(io, " {}", v.level)?;
    if v.message.is_empty() {
        write!(io, " ()")?;
    } else {
        write!(io, " {}", v.message)?;
    }
    writeln!(io, " <{}>", v.location)
}
