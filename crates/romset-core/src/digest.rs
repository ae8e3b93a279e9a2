// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Digest value types.
//!
//! Hashing primitives are out of scope here: parsers hand us digest values
//! already computed, and the rebuild pipeline hands us values it computed
//! from file bytes. These types only carry, compare, and print them.
//!
//! Fixed-width digests follow the `BlobHash` pattern: a `#[repr(transparent)]`
//! newtype over a byte array with a lowercase-hex `Display`. The fuzzy
//! spamsum digest is textual and compared byte-for-byte.

use std::fmt;

use thiserror::Error;

/// Error returned when parsing a digest from hex text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The input had the wrong number of hex characters for the digest kind.
    #[error("digest has wrong length: expected {expected} hex chars, got {got}")]
    Length {
        /// Number of hex characters the digest kind requires.
        expected: usize,
        /// Number of characters actually supplied.
        got: usize,
    },
    /// The input contained a character outside `[0-9a-fA-F]`.
    #[error("digest contains non-hex characters")]
    NotHex,
}

fn decode_fixed<const N: usize>(src: &str) -> Result<[u8; N], DigestError> {
    if src.len() != 2 * N {
        return Err(DigestError::Length {
            expected: 2 * N,
            got: src.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(src, &mut out).map_err(|_| DigestError::NotHex)?;
    Ok(out)
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

macro_rules! fixed_digest {
    ($(#[$doc:meta])* $name:ident, $len:literal) => {
        $(#[$doc])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Parses the digest from lowercase or uppercase hex text.
            ///
            /// # Errors
            ///
            /// Returns [`DigestError`] when the input has the wrong length or
            /// contains non-hex characters.
            pub fn from_hex(src: &str) -> Result<Self, DigestError> {
                decode_fixed(src).map(Self)
            }

            /// Returns the canonical byte representation of this digest.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_hex(f, &self.0)
            }
        }
    };
}

fixed_digest!(
    /// 32-bit CRC digest (the weakest and most widely recorded identity).
    Crc32,
    4
);
fixed_digest!(
    /// MD5 digest.
    Md5,
    16
);
fixed_digest!(
    /// SHA-1 digest.
    Sha1,
    20
);
fixed_digest!(
    /// SHA-256 digest.
    Sha256,
    32
);
fixed_digest!(
    /// SHA-384 digest.
    Sha384,
    48
);
fixed_digest!(
    /// SHA-512 digest.
    Sha512,
    64
);

/// Fuzzy spamsum digest.
///
/// Unlike the fixed-width digests this is free-form text. Equality is exact
/// byte equality; similarity scoring belongs to the (out-of-scope) hashing
/// layer, so two near-miss spamsums are simply not equal here.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SpamSum(pub String);

impl SpamSum {
    /// Wraps a spamsum string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the textual form of the digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpamSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The digest kinds an item may carry, in canonical framing order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DigestKind {
    /// 32-bit CRC.
    Crc32,
    /// MD5.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// Fuzzy spamsum.
    SpamSum,
}

impl DigestKind {
    /// All digest kinds in canonical framing order.
    pub const ALL: [Self; 7] = [
        Self::Crc32,
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::SpamSum,
    ];

    /// Stable lowercase label, used in error messages and hash framing.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::SpamSum => "spamsum",
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of comparing two digest sets kind-by-kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DigestOverlap {
    /// No digest kind is present on both sides; hashes say nothing.
    NoCommon,
    /// At least one kind is present on both sides and every common kind
    /// matches byte-for-byte.
    AllCommonEqual,
    /// Some kind present on both sides disagrees.
    Mismatch,
}

/// The digests recorded for one item. Each kind is independently optional.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct DigestSet {
    /// 32-bit CRC, when recorded.
    pub crc32: Option<Crc32>,
    /// MD5, when recorded.
    pub md5: Option<Md5>,
    /// SHA-1, when recorded.
    pub sha1: Option<Sha1>,
    /// SHA-256, when recorded.
    pub sha256: Option<Sha256>,
    /// SHA-384, when recorded.
    pub sha384: Option<Sha384>,
    /// SHA-512, when recorded.
    pub sha512: Option<Sha512>,
    /// Fuzzy spamsum, when recorded.
    pub spamsum: Option<SpamSum>,
}

impl DigestSet {
    /// Returns `true` when no digest of any kind is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crc32.is_none()
            && self.md5.is_none()
            && self.sha1.is_none()
            && self.sha256.is_none()
            && self.sha384.is_none()
            && self.sha512.is_none()
            && self.spamsum.is_none()
    }

    /// Returns `true` when a digest of `kind` is recorded.
    #[must_use]
    pub fn has(&self, kind: DigestKind) -> bool {
        match kind {
            DigestKind::Crc32 => self.crc32.is_some(),
            DigestKind::Md5 => self.md5.is_some(),
            DigestKind::Sha1 => self.sha1.is_some(),
            DigestKind::Sha256 => self.sha256.is_some(),
            DigestKind::Sha384 => self.sha384.is_some(),
            DigestKind::Sha512 => self.sha512.is_some(),
            DigestKind::SpamSum => self.spamsum.is_some(),
        }
    }

    /// Returns the lowercase-hex (or raw spamsum) text of the digest of
    /// `kind`, when recorded.
    #[must_use]
    pub fn hex(&self, kind: DigestKind) -> Option<String> {
        match kind {
            DigestKind::Crc32 => self.crc32.map(|d| d.to_string()),
            DigestKind::Md5 => self.md5.map(|d| d.to_string()),
            DigestKind::Sha1 => self.sha1.map(|d| d.to_string()),
            DigestKind::Sha256 => self.sha256.map(|d| d.to_string()),
            DigestKind::Sha384 => self.sha384.map(|d| d.to_string()),
            DigestKind::Sha512 => self.sha512.map(|d| d.to_string()),
            DigestKind::SpamSum => self.spamsum.clone().map(|d| d.0),
        }
    }

    /// Compares two sets over every digest kind present on **both** sides.
    ///
    /// Kinds present on only one side are ignored. This implements the
    /// lenient partial-hash policy: an item with only a CRC recorded can
    /// still match an item carrying CRC + MD5 + SHA-1.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> DigestOverlap {
        let mut any_common = false;

        macro_rules! check {
            ($field:ident) => {
                if let (Some(a), Some(b)) = (&self.$field, &other.$field) {
                    any_common = true;
                    if a != b {
                        return DigestOverlap::Mismatch;
                    }
                }
            };
        }

        check!(crc32);
        check!(md5);
        check!(sha1);
        check!(sha256);
        check!(sha384);
        check!(sha512);
        check!(spamsum);

        if any_common {
            DigestOverlap::AllCommonEqual
        } else {
            DigestOverlap::NoCommon
        }
    }

    /// Copies into `self` every digest kind that `other` has and `self`
    /// lacks. Used when a duplicate is merged into its representative so the
    /// survivor carries the union of recorded identities.
    pub fn merge_missing_from(&mut self, other: &Self) {
        if self.crc32.is_none() {
            self.crc32 = other.crc32;
        }
        if self.md5.is_none() {
            self.md5 = other.md5;
        }
        if self.sha1.is_none() {
            self.sha1 = other.sha1;
        }
        if self.sha256.is_none() {
            self.sha256 = other.sha256;
        }
        if self.sha384.is_none() {
            self.sha384 = other.sha384;
        }
        if self.sha512.is_none() {
            self.sha512 = other.sha512;
        }
        if self.spamsum.is_none() {
            self.spamsum.clone_from(&other.spamsum);
        }
    }

    /// Feeds the recorded digests into `hasher` with kind-tagged,
    /// length-prefixed framing, in [`DigestKind::ALL`] order.
    pub(crate) fn update_hasher(&self, hasher: &mut blake3::Hasher) {
        for kind in DigestKind::ALL {
            if let Some(text) = self.hex(kind) {
                hasher.update(kind.label().as_bytes());
                hasher.update(&(text.len() as u64).to_le_bytes());
                hasher.update(text.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_digest_hex_roundtrip() {
        let crc = Crc32::from_hex("DEADBEEF").unwrap();
        assert_eq!(crc.to_string(), "deadbeef");
        assert_eq!(Crc32::from_hex("deadbeef").unwrap(), crc);
    }

    #[test]
    fn fixed_digest_rejects_bad_input() {
        assert_eq!(
            Crc32::from_hex("abc"),
            Err(DigestError::Length {
                expected: 8,
                got: 3
            })
        );
        assert_eq!(Md5::from_hex(&"zz".repeat(16)), Err(DigestError::NotHex));
    }

    #[test]
    fn overlap_ignores_one_sided_kinds() {
        let a = DigestSet {
            crc32: Some(Crc32([0xaa; 4])),
            ..DigestSet::default()
        };
        let b = DigestSet {
            crc32: Some(Crc32([0xaa; 4])),
            md5: Some(Md5([0x11; 16])),
            sha1: Some(Sha1([0x22; 20])),
            ..DigestSet::default()
        };
        assert_eq!(a.overlap(&b), DigestOverlap::AllCommonEqual);
    }

    #[test]
    fn overlap_reports_mismatch_and_no_common() {
        let a = DigestSet {
            crc32: Some(Crc32([0xaa; 4])),
            ..DigestSet::default()
        };
        let b = DigestSet {
            crc32: Some(Crc32([0xbb; 4])),
            ..DigestSet::default()
        };
        assert_eq!(a.overlap(&b), DigestOverlap::Mismatch);

        let c = DigestSet {
            md5: Some(Md5([0x11; 16])),
            ..DigestSet::default()
        };
        assert_eq!(a.overlap(&c), DigestOverlap::NoCommon);
        assert_eq!(DigestSet::default().overlap(&a), DigestOverlap::NoCommon);
    }

    #[test]
    fn merge_missing_fills_only_gaps() {
        let mut a = DigestSet {
            crc32: Some(Crc32([0xaa; 4])),
            ..DigestSet::default()
        };
        let b = DigestSet {
            crc32: Some(Crc32([0xbb; 4])),
            sha1: Some(Sha1([0x22; 20])),
            ..DigestSet::default()
        };
        a.merge_missing_from(&b);
        assert_eq!(a.crc32, Some(Crc32([0xaa; 4])));
        assert_eq!(a.sha1, Some(Sha1([0x22; 20])));
    }
}
