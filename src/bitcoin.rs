//! Types and operations of the Bitcoin side of a swap.
//!
//! Script construction and transaction broadcasting are owned by the wallet
//! implementing the traits below; this module only fixes the vocabulary the
//! flow speaks to it.

use crate::{
    secret::{Secret, SecretHash},
    timestamp::Timestamp,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Bitcoin amount in satoshi.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn from_sat(sat: u64) -> Self {
        Amount(sat)
    }

    pub fn as_sat(self) -> u64 {
        self.0
    }
}

/// A compressed public key on the Bitcoin chain, hex-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(String);

impl From<String> for PublicKey {
    fn from(hex: String) -> Self {
        PublicKey(hex)
    }
}

impl From<&str> for PublicKey {
    fn from(hex: &str) -> Self {
        PublicKey(hex.to_owned())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a transaction on the Bitcoin chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxId(String);

impl From<String> for TxId {
    fn from(id: String) -> Self {
        TxId(id)
    }
}

impl From<&str> for TxId {
    fn from(id: &str) -> Self {
        TxId(id.to_owned())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The parameters of the HTLC script locking our funds.
///
/// `owner_public_key` can spend through the refund branch once `lock_time`
/// has passed, `recipient_public_key` through the redeem branch by revealing
/// the preimage of `secret_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptValues {
    pub secret_hash: SecretHash,
    pub owner_public_key: PublicKey,
    pub recipient_public_key: PublicKey,
    pub lock_time: Timestamp,
}

/// The digest the script uses to verify the revealed secret.
///
/// Swap scripts commit to the secret with sha256; ripemd160 is what wallets
/// default to for other script kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptHash {
    Ripemd160,
    Sha256,
}

impl Default for ScriptHash {
    fn default() -> Self {
        ScriptHash::Ripemd160
    }
}

#[async_trait::async_trait]
pub trait ExecuteFund {
    async fn execute_fund(
        &self,
        script_values: &ScriptValues,
        amount: Amount,
        script_hash: ScriptHash,
    ) -> anyhow::Result<TxId>;
}

#[async_trait::async_trait]
pub trait ExecuteRefund {
    async fn execute_refund(
        &self,
        script_values: &ScriptValues,
        secret: Secret,
    ) -> anyhow::Result<TxId>;
}

/// Provides the local public key that owns the script's refund branch.
pub trait OwnerIdentity {
    fn owner_public_key(&self) -> PublicKey;
}
