// ABOUTME: Phantom-typed ARNs for compile-time type safety.
// ABOUTME: Prevents accidental swapping of listener and target group identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum TargetGroupMarker {}
pub enum ListenerMarker {}

/// A type-safe Amazon Resource Name.
///
/// The phantom parameter ensures a `ListenerArn` can never be passed where a
/// `TargetGroupArn` is expected, which matters here because both are opaque
/// strings of the same shape.
#[must_use = "ARNs reference resources and should not be ignored"]
pub struct Arn<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Arn<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    /// Short human-readable form: the resource path after the last `:`.
    ///
    /// `arn:aws:elasticloadbalancing:...:targetgroup/prod-blue/abc` becomes
    /// `targetgroup/prod-blue/abc`.
    pub fn short(&self) -> &str {
        self.value
            .rsplit_once(':')
            .map(|(_, tail)| tail)
            .unwrap_or(&self.value)
    }
}

// Manual trait implementations that don't require T to implement the trait.

impl<T> std::fmt::Debug for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arn").field("value", &self.value).finish()
    }
}

impl<T> Clone for Arn<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Arn<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Arn<T> {}

impl<T> Hash for Arn<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Arn<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Arn<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type TargetGroupArn = Arn<TargetGroupMarker>;
pub type ListenerArn = Arn<ListenerMarker>;
