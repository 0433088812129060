//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Several backend enums (tire status, execution context) travel as lowercase
//! strings in JSON and in environment variables. This macro gives each of
//! them one `Display` and one case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use fleetdesk_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum AxleSide {
//!     Left,
//!     Right,
//! }
//!
//! impl_domain_status_conversions!(AxleSide {
//!     Left => "left",
//!     Right => "right",
//! });
//!
//! assert_eq!("LEFT".parse::<AxleSide>(), Ok(AxleSide::Left));
//! ```

/// Implements Display and FromStr traits for wire-level enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
