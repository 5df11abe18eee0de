//! Fluent assertion helpers for user checks, ported from `pkg/starlarktruth`.
//!
//! A user check closure reaches for `that(x).is_equal_to(y)` instead of
//! hand-rolling comparisons and message strings; every assertion method
//! returns `Result<(), String>` so checks can use `?` and let the first
//! failing assertion's message become the check's failure message.

use std::fmt::Debug;

/// Wraps a value under test so assertion methods can be chained off it.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a, T> {
    actual: &'a T,
    name: Option<&'a str>,
}

/// Begins a fluent assertion chain over `actual`.
pub fn that<T>(actual: &T) -> Subject<'_, T> {
    Subject { actual, name: None }
}

impl<'a, T> Subject<'a, T> {
    /// Names the subject for clearer failure messages (e.g. `"status code"`).
    #[must_use]
    pub fn named(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    fn label(&self) -> &str {
        self.name.unwrap_or("value")
    }
}

impl<'a, T: PartialEq + Debug> Subject<'a, T> {
    /// Asserts the subject equals `expected`.
    ///
    /// # Errors
    /// Returns a failure message if the subject is not equal to `expected`.
    pub fn is_equal_to(&self, expected: &T) -> Result<(), String> {
        if self.actual == expected {
            Ok(())
        } else {
            Err(format!(
                "expected {} to equal {expected:?}, got {:?}",
                self.label(),
                self.actual
            ))
        }
    }

    /// Asserts the subject does not equal `other`.
    ///
    /// # Errors
    /// Returns a failure message if the subject equals `other`.
    pub fn is_not_equal_to(&self, other: &T) -> Result<(), String> {
        if self.actual == other {
            Err(format!(
                "expected {} not to equal {other:?}",
                self.label()
            ))
        } else {
            Ok(())
        }
    }
}

impl<'a, T: PartialOrd + Debug> Subject<'a, T> {
    /// Asserts the subject is strictly less than `bound`.
    ///
    /// # Errors
    /// Returns a failure message if the subject is not less than `bound`.
    pub fn is_less_than(&self, bound: &T) -> Result<(), String> {
        if self.actual < bound {
            Ok(())
        } else {
            Err(format!(
                "expected {} ({:?}) to be less than {bound:?}",
                self.label(),
                self.actual
            ))
        }
    }

    /// Asserts the subject is strictly greater than `bound`.
    ///
    /// # Errors
    /// Returns a failure message if the subject is not greater than `bound`.
    pub fn is_greater_than(&self, bound: &T) -> Result<(), String> {
        if self.actual > bound {
            Ok(())
        } else {
            Err(format!(
                "expected {} ({:?}) to be greater than {bound:?}",
                self.label(),
                self.actual
            ))
        }
    }

    /// Asserts the subject lies within `[low, high]` inclusive.
    ///
    /// # Errors
    /// Returns a failure message if the subject falls outside the range.
    pub fn is_in_range(&self, low: &T, high: &T) -> Result<(), String> {
        if self.actual >= low && self.actual <= high {
            Ok(())
        } else {
            Err(format!(
                "expected {} ({:?}) to be within [{low:?}, {high:?}]",
                self.label(),
                self.actual
            ))
        }
    }
}

impl<'a> Subject<'a, bool> {
    /// Asserts the subject is `true`.
    ///
    /// # Errors
    /// Returns a failure message if the subject is `false`.
    pub fn is_true(&self) -> Result<(), String> {
        if *self.actual {
            Ok(())
        } else {
            Err(format!("expected {} to be true", self.label()))
        }
    }

    /// Asserts the subject is `false`.
    ///
    /// # Errors
    /// Returns a failure message if the subject is `true`.
    pub fn is_false(&self) -> Result<(), String> {
        if !*self.actual {
            Ok(())
        } else {
            Err(format!("expected {} to be false", self.label()))
        }
    }
}

impl<'a> Subject<'a, String> {
    /// Asserts the subject contains `substring`.
    ///
    /// # Errors
    /// Returns a failure message if the subject does not contain `substring`.
    pub fn contains(&self, substring: &str) -> Result<(), String> {
        if self.actual.contains(substring) {
            Ok(())
        } else {
            Err(format!(
                "expected {} ({:?}) to contain {substring:?}",
                self.label(),
                self.actual
            ))
        }
    }
}

impl<'a, T: PartialEq + Debug> Subject<'a, Vec<T>> {
    /// Asserts the subject contains `item`.
    ///
    /// # Errors
    /// Returns a failure message if the subject does not contain `item`.
    pub fn contains_item(&self, item: &T) -> Result<(), String> {
        if self.actual.contains(item) {
            Ok(())
        } else {
            Err(format!("expected {} to contain {item:?}", self.label()))
        }
    }

    /// Asserts the subject is empty.
    ///
    /// # Errors
    /// Returns a failure message if the subject has any elements.
    pub fn is_empty(&self) -> Result<(), String> {
        if self.actual.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "expected {} to be empty, has {} element(s)",
                self.label(),
                self.actual.len()
            ))
        }
    }
}
