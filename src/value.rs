//! Lazily-evaluated values with fallback chains.
//!
//! A [`Provider`] wraps a computation that may yield a value, yield nothing
//! (absent), or fail. Chains built with [`with_default`] or
//! [`Provider::or_else_compute`] evaluate left to right and stop at the first
//! present value, so an expensive fallback (a file read, a remote query) is
//! never forced when something earlier in the chain is bound.
//!
//! Providers are not memoized: every [`Provider::get`] re-runs the chain, so
//! the result always reflects the sources at the time of the call.

use crate::error::{HelmPilotError, Result};

type Source<'a, T> = Box<dyn Fn() -> Result<Option<T>> + 'a>;

/// A lazily-evaluated, possibly absent value.
pub struct Provider<'a, T> {
    source: Source<'a, T>,
}

impl<'a, T: 'a> Provider<'a, T> {
    /// Create a provider from a computation.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<Option<T>> + 'a,
    {
        Self {
            source: Box::new(f),
        }
    }

    /// A provider that is always present.
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        Self::from_fn(move || Ok(Some(value.clone())))
    }

    /// A provider that is never present.
    pub fn absent() -> Self {
        Self::from_fn(|| Ok(None))
    }

    /// A provider bound to an optional value.
    pub fn from_option(value: Option<T>) -> Self
    where
        T: Clone,
    {
        Self::from_fn(move || Ok(value.clone()))
    }

    /// Evaluate the chain.
    pub fn get(&self) -> Result<Option<T>> {
        (self.source)()
    }

    /// Fall back to `fallback` when this provider is absent.
    pub fn or(self, fallback: Provider<'a, T>) -> Self {
        with_default(self, fallback)
    }

    /// Fall back to a computation when this provider is absent.
    pub fn or_else_compute<F>(self, f: F) -> Self
    where
        F: Fn() -> Result<Option<T>> + 'a,
    {
        self.or(Provider::from_fn(f))
    }

    /// Fall back to a constant when this provider is absent.
    pub fn or_value(self, value: T) -> Self
    where
        T: Clone,
    {
        self.or(Provider::of(value))
    }

    /// Transform the value if present.
    pub fn map<U: 'a, F>(self, f: F) -> Provider<'a, U>
    where
        F: Fn(T) -> U + 'a,
    {
        Provider::from_fn(move || Ok(self.get()?.map(&f)))
    }

    /// Evaluate the chain, treating absence as a configuration error.
    ///
    /// `what` names the value and `sources` lists where it was looked up,
    /// both of which end up in the error message.
    pub fn require(&self, what: &str, sources: &[&str]) -> Result<T> {
        self.get()?
            .ok_or_else(|| HelmPilotError::missing(what, sources))
    }
}

/// Yield `primary` if present, otherwise `fallback`.
///
/// `fallback` is only evaluated when `primary` is absent. An error from
/// `primary` propagates as-is; the fallback stands in for absence, not for
/// failure.
pub fn with_default<'a, T: 'a>(
    primary: Provider<'a, T>,
    fallback: Provider<'a, T>,
) -> Provider<'a, T> {
    Provider::from_fn(move || match primary.get()? {
        Some(value) => Ok(Some(value)),
        None => fallback.get(),
    })
}
