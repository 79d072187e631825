/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Test helpers: a manually advanced timer and log capture.

mod log_capture;
pub mod tick_advance_sleep;

pub use log_capture::{capture_test_logs, LogCaptureGuard, Rx};
