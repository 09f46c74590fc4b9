use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Our identifier for a swap, assigned when the swap is created and used to
/// key the database.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SwapId(Uuid);

impl SwapId {
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for SwapId {
    fn default() -> Self {
        SwapId(Uuid::new_v4())
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier the counterparty's contract assigns to the swap once it
/// acknowledges it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SharedSwapId(u64);

impl From<u64> for SharedSwapId {
    fn from(id: u64) -> Self {
        SharedSwapId(id)
    }
}

impl fmt::Display for SharedSwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
