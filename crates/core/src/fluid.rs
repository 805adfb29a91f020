//! Fluid identities and fluid stacks.
//!
//! A [`FluidId`] is a stable lowercase key naming a fluid (e.g. `water`,
//! `fuel`). Every fluid comparison in the workspace goes through
//! [`FluidId`] equality; there is no secondary numeric-id path. A
//! [`FluidStack`] pairs an identity with a strictly positive amount — the
//! "empty" state is `Option<FluidStack>::None` at the container level, so
//! a zero-amount stack is unrepresentable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

use crate::tag::{TagCompound, TagError};

/// Error returned when parsing an invalid [`FluidId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FluidIdError {
    message: String,
}

impl FluidIdError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Stable identity of a fluid.
///
/// Keys are lowercase ASCII (`a-z`, `0-9`, `_`), non-empty, at most 64
/// bytes. Ordering is lexical and stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FluidId(String);

impl FluidId {
    /// Parse a fluid key.
    pub fn new(key: &str) -> Result<Self, FluidIdError> {
        if key.is_empty() {
            return Err(FluidIdError::new("FluidId cannot be empty"));
        }
        if key.len() > 64 {
            return Err(FluidIdError::new("FluidId too long (max 64)"));
        }
        if !key.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_')) {
            return Err(FluidIdError::new(format!(
                "FluidId `{key}` contains characters outside [a-z0-9_]"
            )));
        }
        Ok(Self(key.to_string()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FluidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FluidId {
    type Err = FluidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An amount of one specific fluid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidStack {
    fluid: FluidId,
    amount: NonZeroU32,
}

impl FluidStack {
    /// Create a stack. Returns `None` for a zero amount; depleted stacks
    /// are modeled as an absent `Option`, never as an amount of zero.
    pub fn new(fluid: FluidId, amount: u32) -> Option<Self> {
        NonZeroU32::new(amount).map(|amount| Self { fluid, amount })
    }

    /// The fluid this stack holds.
    pub fn fluid(&self) -> &FluidId {
        &self.fluid
    }

    /// Amount of fluid in this stack (always at least 1).
    pub fn amount(&self) -> u32 {
        self.amount.get()
    }

    /// Copy of this stack with a different amount.
    pub fn with_amount(&self, amount: NonZeroU32) -> Self {
        Self {
            fluid: self.fluid.clone(),
            amount,
        }
    }

    /// Overwrite the amount.
    pub fn set_amount(&mut self, amount: NonZeroU32) {
        self.amount = amount;
    }

    /// Whether `other` holds the same fluid, regardless of amount.
    pub fn is_fluid_equal(&self, other: &FluidStack) -> bool {
        self.fluid == other.fluid
    }

    /// Increase the amount by `add`, saturating at `u32::MAX`.
    pub fn grow(&mut self, add: u32) {
        self.amount = self.amount.saturating_add(add);
    }

    /// Reduce the amount by `sub`.
    ///
    /// Returns `false` and leaves the stack untouched if that would empty
    /// or overdraw it; callers empty the containing slot instead.
    pub fn shrink(&mut self, sub: u32) -> bool {
        match NonZeroU32::new(self.amount.get().saturating_sub(sub)) {
            Some(rest) => {
                self.amount = rest;
                true
            }
            None => false,
        }
    }

    /// Encode this stack into a tag compound (`fluid` + `amount` fields).
    pub fn to_tag(&self) -> TagCompound {
        let mut tag = TagCompound::new();
        tag.set_text("fluid", self.fluid.as_str());
        tag.set_int("amount", i64::from(self.amount.get()));
        tag
    }

    /// Decode a stack previously written by [`FluidStack::to_tag`].
    pub fn from_tag(tag: &TagCompound) -> Result<Self, TagError> {
        let fluid = tag.text("fluid").ok_or_else(|| TagError::missing("fluid"))?;
        let fluid =
            FluidId::new(fluid).map_err(|err| TagError::invalid("fluid", err.to_string()))?;

        let amount = tag
            .int("amount")
            .ok_or_else(|| TagError::missing("amount"))?;
        let amount = u32::try_from(amount)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                TagError::invalid("amount", format!("expected a positive amount, got {amount}"))
            })?;

        Ok(Self { fluid, amount })
    }
}

impl fmt::Display for FluidStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.amount, self.fluid)
    }
}
