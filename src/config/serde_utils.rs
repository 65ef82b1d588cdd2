// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Serde-specific utilties

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde "module" for (de)serilizing [`Duration`]s as milliseconds
pub struct Millis;

impl Millis {
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_u64(MillisVisitor)
    }
}

/// Serde "module" for (de)serilizing optional [`Duration`]s as milliseconds
pub struct MaybeMillis;

impl MaybeMillis {
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(|v| u64::try_from(v.as_millis()).unwrap_or(u64::MAX))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Wrapped>::deserialize(deserializer).map(|v| v.map(|Wrapped(d)| d))
    }
}

/// Helper for deserializing a [`Duration`] nested in another type
struct Wrapped(Duration);

impl<'de> Deserialize<'de> for Wrapped {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Millis::deserialize(deserializer).map(Self)
    }
}

/// [`Visitor`][serde::de::Visitor] for parsing milliseconds
struct MillisVisitor;

impl serde::de::Visitor<'_> for MillisVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a non-negative number of milliseconds")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Duration::from_millis(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        u64::try_from(v).map(Duration::from_millis).map_err(|_| {
            E::invalid_value(
                serde::de::Unexpected::Signed(v),
                &"a non-negative number",
            )
        })
    }
}
