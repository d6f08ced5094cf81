/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

#[derive(Default)]
pub struct HttpServerStats {
    accepted: AtomicU64,
    accept_failed: AtomicU64,

    task_total: AtomicU64,
    task_alive_count: AtomicI32,

    request_total: AtomicU64,
}

impl HttpServerStats {
    pub(crate) fn add_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_accept_failed(&self) {
        self.accept_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_task(&self) {
        self.task_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_alive_task(&self) {
        self.task_alive_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dec_alive_task(&self) {
        self.task_alive_count.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn add_request(&self) {
        self.request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn get_accept_failed(&self) -> u64 {
        self.accept_failed.load(Ordering::Relaxed)
    }

    pub fn get_task_total(&self) -> u64 {
        self.task_total.load(Ordering::Relaxed)
    }

    pub fn get_alive_count(&self) -> i32 {
        self.task_alive_count.load(Ordering::Relaxed)
    }

    pub fn get_request_total(&self) -> u64 {
        self.request_total.load(Ordering::Relaxed)
    }
}
