//! Ledger identifier newtypes.
//!
//! Every identifier wraps a 32-byte Keccak digest. The inner value is private
//! so construction goes through [`crate::domain::identifier`] or the explicit
//! `from_digest` constructors.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, keccak256, B256};
use serde::{Deserialize, Serialize};

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(B256);

        impl $name {
            /// Wrap an existing digest.
            #[must_use]
            pub const fn from_digest(digest: B256) -> Self {
                Self(digest)
            }

            /// The underlying digest.
            #[must_use]
            pub const fn digest(&self) -> B256 {
                self.0
            }

            /// Raw big-endian bytes.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0 .0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<B256> for $name {
            fn from(digest: B256) -> Self {
                Self(digest)
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<B256>().map(Self)
            }
        }
    };
}

digest_id!(
    /// Identifier of a condition: `keccak256(oracle ‖ question ‖ slot count)`.
    ConditionId
);

digest_id!(
    /// Identifier of a collection of outcome-contingent claims.
    ///
    /// The zero digest is the root collection, i.e. unconditioned collateral.
    CollectionId
);

digest_id!(
    /// Ledger slot for claims on one collateral token under one collection.
    PositionId
);

digest_id!(
    /// Oracle-chosen question identifier.
    QuestionId
);

impl CollectionId {
    /// The root collection (unconditioned collateral).
    pub const ROOT: Self = Self(B256::ZERO);

    /// Whether this is the root collection.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_zero()
    }
}

impl QuestionId {
    /// Parse a question identifier, hashing free text.
    ///
    /// A `0x`-prefixed 64-digit hex string is taken verbatim; anything else is
    /// hashed with Keccak-256 so human labels map to stable identifiers.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.parse::<B256>() {
            Ok(digest) if label.starts_with("0x") => Self(digest),
            _ => Self(keccak256(label.as_bytes())),
        }
    }
}
