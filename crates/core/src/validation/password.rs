//! Passwords stay wrapped in [`SecretString`] from the posted form to the
//! API request body and are only exposed while that body is serialized.

use std::borrow::Borrow;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serializer};

/// An empty password, the value of a field that was not posted.
#[must_use]
pub fn blank() -> SecretString {
    SecretString::from(String::new())
}

/// `deserialize_with` for posted password fields.
///
/// # Errors
///
/// Returns the deserializer's error if the field is not a string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// `serialize_with` for request bodies carrying a password, owned or
/// borrowed.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn serialize<T, S>(secret: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Borrow<SecretString>,
    S: Serializer,
{
    serializer.serialize_str(secret.borrow().expose_secret())
}

/// `serialize_with` for an optional password; pair it with
/// `skip_serializing_if = "Option::is_none"`.
///
/// # Errors
///
/// Returns the serializer's error.
#[allow(clippy::ref_option)]
pub fn serialize_optional<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serialize(secret, serializer),
        None => serializer.serialize_none(),
    }
}
