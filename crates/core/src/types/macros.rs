//! Helper macros shared by the type modules.

/// Implements `as_str`, `label`, `ALL`, `Display` and `FromStr` for a wire enum.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => ($wire:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire value sent to and received from the API.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}
