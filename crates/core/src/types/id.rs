//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use subify_core::define_id;
/// define_id!(ReviewId);
/// define_id!(ShipmentId);
///
/// let review_id = ReviewId::new(1);
/// let shipment_id = ShipmentId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ReviewId = shipment_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Catalog products are numbered by the catalog service.
define_id!(ProductId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_as_number() {
        let id = ProductId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_product_id_from_str() {
        assert_eq!(" 7 ".parse::<ProductId>().unwrap(), ProductId::new(7));
        assert!("seven".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_product_id_display() {
        assert_eq!(ProductId::new(101).to_string(), "101");
    }
}
