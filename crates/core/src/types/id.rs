//! Newtype IDs for type-safe entity references.
//!
//! The remote API issues opaque string identifiers (document ids). Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing
//! IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use storehouse_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget = WidgetId::new("65f0c1");
/// let gadget = GadgetId::new("65f0c1");
/// assert_eq!(widget.as_str(), gadget.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(PromotionId);
define_id!(RoleId);
define_id!(AdminAccountId);
define_id!(CustomerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_transparent_on_the_wire() {
        let id = ProductId::new("65f0c1a2");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"65f0c1a2\""));

        let parsed: Option<ProductId> = serde_json::from_str("\"abc\"").ok();
        assert_eq!(parsed, Some(ProductId::from("abc")));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(OrderId::new("o-1").to_string(), "o-1");
    }
}
