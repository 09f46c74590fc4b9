//! Types and operations of the EOS side of a swap.

use crate::{secret::Secret, timestamp::RelativeTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An EOS account name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account(String);

impl From<String> for Account {
    fn from(name: String) -> Self {
        Account(name)
    }
}

impl From<&str> for Account {
    fn from(name: &str) -> Self {
        Account(name.to_owned())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a transaction on the EOS chain.
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

/// Fetch the lock period the counterparty's contract enforces.
#[async_trait::async_trait]
pub trait GetLockPeriod {
    async fn lock_period(&self) -> anyhow::Result<RelativeTime>;
}

/// Claim the EOS the counterparty locked, revealing the secret on chain.
#[async_trait::async_trait]
pub trait ExecuteWithdraw {
    async fn execute_withdraw(&self, owner: &Account, secret: Secret) -> anyhow::Result<TxId>;
}
