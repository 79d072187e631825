/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::env;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::fmt::TestWriter;

const VERBOSE_TEST_LOGS: &str = "VERBOSE_TEST_LOGS";

/// Stops log capturing when dropped.
#[derive(Debug)]
pub struct LogCaptureGuard(#[allow(dead_code)] Option<DefaultGuard>);

/// Capture every log event emitted on this thread until the guard is dropped.
///
/// Captured output is only echoed to the test output when `VERBOSE_TEST_LOGS` is set.
#[must_use]
pub fn capture_test_logs() -> (LogCaptureGuard, Rx) {
    let buf: Arc<Mutex<Vec<u8>>> = Default::default();
    let tee = Tee {
        buf: buf.clone(),
        loud: env::var(VERBOSE_TEST_LOGS).is_ok(),
        inner: TestWriter::new(),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(Mutex::new(tee))
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (LogCaptureGuard(Some(guard)), Rx(buf))
}

/// Receiver for the captured logs.
#[derive(Debug)]
pub struct Rx(Arc<Mutex<Vec<u8>>>);

impl Rx {
    /// Returns the captured logs as a string.
    ///
    /// # Panics
    /// This will panic if the logs are not valid UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct Tee<W> {
    buf: Arc<Mutex<Vec<u8>>>,
    loud: bool,
    inner: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        if self.loud {
            self.inner.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
