/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The aggregate failure produced when every racing operation (or every retry attempt) failed.

use std::error::Error;
use std::fmt;

/// Failure reasons accumulated during a single combinator run.
///
/// Reasons appear in the order the operations *settled*, which is not necessarily the order in
/// which they were passed in. For [`retry`](crate::future::retry::retry), index 0 is the first
/// attempt's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonLog<E> {
    reasons: Vec<E>,
}

impl<E> ReasonLog<E> {
    pub(crate) fn new() -> Self {
        Self {
            reasons: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, reason: E) {
        self.reasons.push(reason);
    }

    pub(crate) fn take(&mut self) -> Self {
        Self {
            reasons: std::mem::take(&mut self.reasons),
        }
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    /// Returns true if no failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Iterate over the reasons in settlement order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.reasons.iter()
    }

    /// The reason recorded last, if any.
    pub fn last(&self) -> Option<&E> {
        self.reasons.last()
    }

    /// Consume the log, returning the reasons in settlement order.
    pub fn into_vec(self) -> Vec<E> {
        self.reasons
    }
}

impl<E> From<Vec<E>> for ReasonLog<E> {
    fn from(reasons: Vec<E>) -> Self {
        Self { reasons }
    }
}

impl<E> IntoIterator for ReasonLog<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.reasons.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a ReasonLog<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.reasons.iter()
    }
}

impl<E: fmt::Display> fmt::Display for ReasonLog<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation(s) failed", self.reasons.len())?;
        for (idx, reason) in self.reasons.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{reason}")?;
        }
        Ok(())
    }
}

impl<E> Error for ReasonLog<E> where E: Error + 'static {}

#[cfg(test)]
mod tests {
    use super::ReasonLog;

    #[test]
    fn display_lists_reasons_in_order() {
        let log = ReasonLog::from(vec!["x", "y", "z"]);
        assert_eq!("3 operation(s) failed: x; y; z", log.to_string());
        assert_eq!("0 operation(s) failed", ReasonLog::<&str>::new().to_string());
    }

    #[test]
    fn take_leaves_an_empty_log_behind() {
        let mut log = ReasonLog::new();
        log.push(1);
        log.push(2);
        let taken = log.take();
        assert!(log.is_empty());
        assert_eq!(vec![1, 2], taken.into_vec());
    }
}
