//! # Key/Record Type Definitions
//!
//! Core data types for BinKV records, shared by the client bindings and every
//! `Cluster` implementation.
//!
//! ## Design Principles
//!
//! 1. **Digest Identity**: A key is identified by `(namespace, set, digest)`.
//!    The user key is carried along for display and echo, never for equality.
//!
//! 2. **Fixed Bin-Name Slots**: Bin names live in a 16-byte slot (15 usable
//!    bytes plus terminator on the wire). Over-long names are rejected at
//!    construction; they are never truncated, because truncation can merge two
//!    distinct names into one.
//!
//! 3. **Len-Based Eq/Hash**: `BinName` compares and hashes only initialized
//!    bytes of its slot.
//!
//! 4. **Metadata Split**: `RecordMeta` (generation + ttl) travels alone for
//!    existence checks; full `Record`s carry bins as well.
//!
//! ## Memory Layout Example
//!
//! ```text
//! BinName (17 bytes total):
//! +--------+-----------+
//! | len:1B | data:16B  |
//! +--------+-----------+
//!
//! Digest (20 bytes):
//! +------------------------------------------------+
//! | SHA-256(set || particle_type || key)[..20]      |
//! +------------------------------------------------+
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;
use sha2::{Digest as _, Sha256};

use crate::error::{BkvError, BkvResult, Status};
use crate::value::Value;

/// Bin-name slot size on the wire, terminator included.
pub const BIN_NAME_MAX_SIZE: usize = 16;

/// Maximum usable bin-name length in bytes.
pub const BIN_NAME_MAX_LEN: usize = BIN_NAME_MAX_SIZE - 1;

/// Maximum namespace length in bytes.
pub const NAMESPACE_MAX_LEN: usize = 31;

/// Maximum set-name length in bytes.
pub const SET_MAX_LEN: usize = 63;

/// Digest size in bytes.
pub const DIGEST_SIZE: usize = 20;

/// TTL reported for records that never expire.
pub const TTL_NEVER_EXPIRE: u32 = u32::MAX;

/// Particle type tags folded into the digest.
const PARTICLE_INTEGER: u8 = 1;
const PARTICLE_STRING: u8 = 3;
const PARTICLE_BLOB: u8 = 4;

/// Primary-key value supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    Integer(i64),
    String(String),
    Bytes(Bytes),
}

impl UserKey {
    fn particle_type(&self) -> u8 {
        match self {
            UserKey::Integer(_) => PARTICLE_INTEGER,
            UserKey::String(_) => PARTICLE_STRING,
            UserKey::Bytes(_) => PARTICLE_BLOB,
        }
    }

    /// Converts the key back into its external value.
    pub fn to_value(&self) -> Value {
        match self {
            UserKey::Integer(value) => Value::Integer(*value),
            UserKey::String(value) => Value::String(value.clone()),
            UserKey::Bytes(value) => Value::Bytes(value.clone()),
        }
    }
}

/// Record digest derived from the set name and user key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Computes the digest of `user_key` within `set`.
    pub fn compute(set: &str, user_key: &UserKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(set.as_bytes());
        hasher.update([user_key.particle_type()]);
        match user_key {
            UserKey::Integer(value) => hasher.update(value.to_be_bytes()),
            UserKey::String(value) => hasher.update(value.as_bytes()),
            UserKey::Bytes(value) => hasher.update(value),
        }
        let full = hasher.finalize();
        let mut out = [0u8; DIGEST_SIZE];
        out.copy_from_slice(&full[..DIGEST_SIZE]);
        Digest(out)
    }

    /// Builds a digest from raw bytes.
    ///
    /// # Errors
    /// Returns `ParameterError` unless exactly `DIGEST_SIZE` bytes are given.
    pub fn from_slice(data: &[u8]) -> BkvResult<Self> {
        let bytes: [u8; DIGEST_SIZE] = data.try_into().map_err(|_| {
            BkvError::param(format!(
                "digest must be {} bytes, got {}",
                DIGEST_SIZE,
                data.len()
            ))
        })?;
        Ok(Digest(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Record key.
///
/// Equality and hashing use `(namespace, set, digest)` only, so a key built
/// from a user key and one built from the matching digest are the same key.
#[derive(Clone)]
pub struct Key {
    namespace: String,
    set: String,
    user_key: Option<UserKey>,
    digest: Digest,
}

impl Key {
    /// Creates a key from a user key, computing its digest.
    ///
    /// # Errors
    /// Returns `ParameterError` for an empty or over-long namespace or set.
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        user_key: UserKey,
    ) -> BkvResult<Self> {
        let namespace = namespace.into();
        let set = set.into();
        validate_names(&namespace, &set)?;
        let digest = Digest::compute(&set, &user_key);
        Ok(Key {
            namespace,
            set,
            user_key: Some(user_key),
            digest,
        })
    }

    /// Creates a key that only knows its digest.
    ///
    /// # Errors
    /// Returns `ParameterError` for an empty or over-long namespace or set.
    pub fn from_digest(
        namespace: impl Into<String>,
        set: impl Into<String>,
        digest: Digest,
    ) -> BkvResult<Self> {
        let namespace = namespace.into();
        let set = set.into();
        validate_names(&namespace, &set)?;
        Ok(Key {
            namespace,
            set,
            user_key: None,
            digest,
        })
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn set(&self) -> &str {
        &self.set
    }

    /// Returns the user key, or `None` for digest-only keys.
    #[inline]
    pub fn user_key(&self) -> Option<&UserKey> {
        self.user_key.as_ref()
    }

    #[inline]
    pub fn digest(&self) -> &Digest {
        &self.digest
    }
}

fn validate_names(namespace: &str, set: &str) -> BkvResult<()> {
    if namespace.is_empty() {
        return Err(BkvError::param("namespace must not be empty"));
    }
    if namespace.len() > NAMESPACE_MAX_LEN {
        return Err(BkvError::param(format!(
            "namespace exceeds {} bytes",
            NAMESPACE_MAX_LEN
        )));
    }
    if set.len() > SET_MAX_LEN {
        return Err(BkvError::param(format!("set exceeds {} bytes", SET_MAX_LEN)));
    }
    Ok(())
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.namespace == other.namespace && self.set == other.set
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.set.hash(state);
        self.digest.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("namespace", &self.namespace)
            .field("set", &self.set)
            .field("user_key", &self.user_key)
            .field("digest", &self.digest)
            .finish()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_key {
            Some(user_key) => write!(
                f,
                "{}:{}:{}",
                self.namespace,
                self.set,
                user_key.to_value()
            ),
            None => write!(f, "{}:{}:{}", self.namespace, self.set, self.digest),
        }
    }
}

/// Bin name with bounded size
///
/// Stored in a fixed slot so the request builder knows the exact width of
/// every name it writes.
#[derive(Clone, Copy)]
pub struct BinName {
    /// Actual length of the name (≤ BIN_NAME_MAX_LEN)
    len: u8,
    /// Name buffer (only first `len` bytes are valid)
    data: [u8; BIN_NAME_MAX_SIZE],
}

// Compare only initialized bytes (length-prefixed buffer pattern).
impl PartialEq for BinName {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for BinName {}

impl Hash for BinName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.as_bytes().hash(state);
    }
}

impl BinName {
    /// Creates a bin name from text.
    ///
    /// # Errors
    /// Returns `BinNameTooLong` above `BIN_NAME_MAX_LEN` bytes and
    /// `ParameterError` for an empty name.
    ///
    /// # Examples
    /// ```rust
    /// use bkv_common::{BinName, Status, BIN_NAME_MAX_LEN};
    ///
    /// let name = BinName::new("age").expect("valid name");
    /// assert_eq!(name.as_str(), "age");
    ///
    /// let too_long = "x".repeat(BIN_NAME_MAX_LEN + 1);
    /// assert_eq!(BinName::new(&too_long).unwrap_err().status(), Status::BinNameTooLong);
    /// ```
    pub fn new(name: &str) -> BkvResult<Self> {
        if name.is_empty() {
            return Err(BkvError::param("bin name must not be empty"));
        }
        if name.len() > BIN_NAME_MAX_LEN {
            return Err(BkvError::new(
                Status::BinNameTooLong,
                format!(
                    "bin name '{}' exceeds {} bytes",
                    name, BIN_NAME_MAX_LEN
                ),
            ));
        }

        let mut bin = BinName {
            len: name.len() as u8,
            data: [0u8; BIN_NAME_MAX_SIZE],
        };
        bin.data[..name.len()].copy_from_slice(name.as_bytes());
        Ok(bin)
    }

    /// Returns the valid name bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Returns the name as text.
    #[inline]
    pub fn as_str(&self) -> &str {
        // Only whole `&str` values are ever copied in.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for BinName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinName({:?})", self.as_str())
    }
}

impl fmt::Display for BinName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record metadata returned by existence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordMeta {
    /// Write counter, bumped on every update.
    pub generation: u32,
    /// Seconds until expiration, or `TTL_NEVER_EXPIRE`.
    pub ttl: u32,
}

/// Ordered bin-name to value mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bins {
    entries: Vec<(BinName, Value)>,
}

impl Bins {
    pub fn new() -> Self {
        Bins::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Bins {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or replaces a bin, keeping its position on replace.
    pub fn insert(&mut self, name: BinName, value: Value) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(bin, _)| bin.as_str() == name)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &BinName) -> Option<Value> {
        let idx = self.entries.iter().position(|(bin, _)| bin == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BinName, &Value)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(BinName, Value)> for Bins {
    fn from_iter<I: IntoIterator<Item = (BinName, Value)>>(iter: I) -> Self {
        let mut bins = Bins::new();
        for (name, value) in iter {
            bins.insert(name, value);
        }
        bins
    }
}

/// Full record as returned by a projected read.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub meta: RecordMeta,
    pub bins: Bins,
}
