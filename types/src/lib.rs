//! Core domain types for Aether.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! token kinds, placed instances, surface coordinates and recipe keys.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)]

mod ids;
mod sanitize;
mod text;

pub use ids::InstanceId;
pub use sanitize::sanitize_display_text;
pub use text::{first_grapheme, truncate_with_ellipsis};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Kind Identifiers
// ============================================================================

/// Stable identifier of a token kind (`fire`, `mud-pie`, ...).
///
/// Invariant: non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KindId(Cow<'static, str>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KindIdError {
    #[error("kind id cannot be empty")]
    Empty,
    #[error("kind id cannot contain whitespace (got {0:?})")]
    Whitespace(String),
}

impl KindId {
    pub fn new(raw: impl Into<String>) -> Result<Self, KindIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(KindIdError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(KindIdError::Whitespace(raw));
        }
        Ok(Self(Cow::Owned(raw)))
    }

    /// Seed identifiers baked into the binary.
    #[must_use]
    pub const fn known(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Derive an identifier from a display name.
    ///
    /// Lower-cases the name and collapses every whitespace run into a single
    /// `-`, so "Mud Pie", "mud  pie" and " MUD PIE " all converge on `mud-pie`.
    pub fn from_display_name(name: &str) -> Result<Self, KindIdError> {
        let id = name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        Self::new(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for KindId {
    type Error = KindIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for KindId {
    type Error = KindIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KindId> for String {
    fn from(value: KindId) -> Self {
        value.0.into_owned()
    }
}

impl AsRef<str> for KindId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// Token Kinds
// ============================================================================

/// A discovered or seeded species of token.
///
/// Everything except `id` is presentation metadata the engine never inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenKind {
    pub id: KindId,
    pub name: String,
    /// Single emoji shown on the token.
    pub glyph: String,
    /// Hex color such as `#ef4444`.
    pub color: String,
    pub description: String,
}

impl TokenKind {
    #[must_use]
    pub fn new(
        id: KindId,
        name: impl Into<String>,
        glyph: impl Into<String>,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            glyph: glyph.into(),
            color: color.into(),
            description: description.into(),
        }
    }
}

// ============================================================================
// Recipes
// ============================================================================

/// Order-independent key of a combination rule.
///
/// The two kind ids are stored sorted, so `RecipeKey::new(a, b)` and
/// `RecipeKey::new(b, a)` are equal and hash identically. Self-pairing is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeKey {
    first: KindId,
    second: KindId,
}

impl RecipeKey {
    #[must_use]
    pub fn new(a: KindId, b: KindId) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    #[must_use]
    pub fn first(&self) -> &KindId {
        &self.first
    }

    #[must_use]
    pub fn second(&self) -> &KindId {
        &self.second
    }

    #[must_use]
    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }
}

impl fmt::Display for RecipeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}

// ============================================================================
// Surface Geometry
// ============================================================================

/// A point in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn midpoint(self, other: Position) -> Position {
        Position::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn offset_x(self, dx: f64) -> Position {
        Position::new(self.x + dx, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// A token placed on the work surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInstance {
    pub id: InstanceId,
    pub kind: KindId,
    pub position: Position,
}
