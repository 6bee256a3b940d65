//! Newtype document IDs for type-safe record references.
//!
//! Document stores hand out opaque string keys. Use the `define_id!` macro to
//! wrap them so that a news ID can never be passed where a menu item ID is
//! expected.

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use skydeck_core::define_id;
/// define_id!(CupId);
/// define_id!(SaucerId);
///
/// let cup = CupId::new("abc");
/// let saucer = SaucerId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: CupId = saucer;
/// assert_eq!(cup.as_str(), saucer.as_str());
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
            /// Create a new ID from a document key.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying document key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the document key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Identity provider principal. Profile and preference records are keyed by it.
define_id!(Uid);

// Document IDs, one per collection.
define_id!(NewsId);
define_id!(MenuItemId);
define_id!(OrderId);
define_id!(PreOrderId);
define_id!(SubmissionId);
define_id!(SubscriptionId);
define_id!(ContentId);
define_id!(ContactInfoId);
define_id!(ImageId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_key() {
        let id = NewsId::new("n-42");
        assert_eq!(id.to_string(), "n-42");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = Uid::new("firebase-uid");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"firebase-uid\"");

        let parsed: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_ordering_follows_key() {
        let mut ids = vec![NewsId::new("b"), NewsId::new("a"), NewsId::new("c")];
        ids.sort();
        let keys: Vec<&str> = ids.iter().map(NewsId::as_str).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
