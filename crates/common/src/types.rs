//! Primitive identifiers shared by the ledger, the operator registry and
//! the quorum engine.

use hex::{decode as hex_decode, encode as hex_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Dense, sequentially assigned validator identifier.
pub type ValidatorId = u64;

/// Identifier of the chain a proof is submitted for.
pub type ChainId = u64;

/// Block height on the target chain.
pub type BlockHeight = u64;

/// Token amount in the smallest unit (18 decimals).
pub type Amount = u128;

// ════════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ════════════════════════════════════════════════════════════════════════════════

/// Account identifier (20 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self { Address(b) }
    pub fn as_bytes(&self) -> &[u8; 20] { &self.0 }
    pub fn is_zero(&self) -> bool { self.0 == [0u8; 20] }
    pub fn to_hex(&self) -> String { hex_encode(self.0) }
    pub fn from_hex(s: &str) -> Result<Self, anyhow::Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex_decode(s)?;
        if bytes.len() != 20 { anyhow::bail!("invalid address length: {}", bytes.len()); }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_hex()).finish()
    }
}
impl FromStr for Address {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Address, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// HASH32
// ════════════════════════════════════════════════════════════════════════════════

/// 32-byte fingerprint of a block specimen or block result.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub fn from_bytes(b: [u8; 32]) -> Self { Hash32(b) }
    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
    pub fn to_hex(&self) -> String { hex_encode(self.0) }

    /// Keccak-256 of arbitrary content.
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        let out = Keccak256::digest(data.as_ref());
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&out);
        Hash32(arr)
    }

    pub fn from_hex(s: &str) -> Result<Self, anyhow::Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex_decode(s)?;
        if bytes.len() != 32 { anyhow::bail!("invalid hash length: {}", bytes.len()); }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash32(arr))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form keeps log lines readable
        write!(f, "Hash32({}..)", &self.to_hex()[..12])
    }
}

impl Serialize for Hash32 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Hash32, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Hash32::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ROUND KIND
// ════════════════════════════════════════════════════════════════════════════════

/// Which fingerprint a session collects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundKind {
    Specimen,
    Result,
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKind::Specimen => f.write_str("specimen"),
            RoundKind::Result => f.write_str("result"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// OPERATOR ROLE
// ════════════════════════════════════════════════════════════════════════════════

/// Role held by an operator account.
///
/// An account maps to at most one role. `Unassigned` is the state of an
/// account that was never registered or has been removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorRole {
    #[default]
    Unassigned,
    BlockSpecimenProducer,
    BlockResultProducer,
}

impl OperatorRole {
    /// Round kind an operator of this role submits for.
    pub fn round_kind(&self) -> Option<RoundKind> {
        match self {
            OperatorRole::Unassigned => None,
            OperatorRole::BlockSpecimenProducer => Some(RoundKind::Specimen),
            OperatorRole::BlockResultProducer => Some(RoundKind::Result),
        }
    }
}

impl RoundKind {
    /// Operator role allowed to submit in rounds of this kind.
    pub fn role(&self) -> OperatorRole {
        match self {
            RoundKind::Specimen => OperatorRole::BlockSpecimenProducer,
            RoundKind::Result => OperatorRole::BlockResultProducer,
        }
    }
}

impl fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorRole::Unassigned => f.write_str("unassigned"),
            OperatorRole::BlockSpecimenProducer => f.write_str("block-specimen-producer"),
            OperatorRole::BlockResultProducer => f.write_str("block-result-producer"),
        }
    }
}

/// When a submission's height is checked against the live-sync window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveSyncPolicy {
    /// Only the submission that opens a session is checked.
    #[default]
    FirstSubmission,
    /// Every submission is checked.
    EverySubmission,
}
