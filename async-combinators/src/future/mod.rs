/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Runtime agnostic combinator futures.

pub mod always;
pub mod never;
pub mod none;
pub mod retry;
pub mod schedule;
pub mod some;
pub mod timeout;
