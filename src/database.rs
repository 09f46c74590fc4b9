use crate::{
    bitcoin, eos,
    secret::{Secret, SecretHash},
    swap::SwapParams,
    swap_id::{SharedSwapId, SwapId},
};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

pub trait Load<T>: Send + Sync + 'static {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<T>>;
}

#[async_trait::async_trait]
pub trait Save<T>: Send + Sync + 'static {
    async fn save(&self, elem: T, swap_id: SwapId) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct Database {
    db: sled::Db,
    #[cfg(test)]
    tmp_dir: tempfile::TempDir,
}

impl Database {
    #[cfg(not(test))]
    pub fn new(path: &std::path::Path) -> anyhow::Result<Self> {
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("the path is not utf-8 valid: {:?}", path))?;
        let db = sled::open(path).with_context(|| format!("could not open the DB at {}", path))?;

        Ok(Database { db })
    }

    #[cfg(test)]
    pub fn new_test() -> anyhow::Result<Self> {
        let tmp_dir = tempfile::TempDir::new().context("could not create temporary directory")?;
        let db = sled::open(tmp_dir.path())
            .with_context(|| format!("could not open the DB at {}", tmp_dir.path().display()))?;

        Ok(Database { db, tmp_dir })
    }

    /// Create the record for a new swap, with no step output recorded yet.
    pub async fn insert(&self, swap_id: SwapId, params: SwapParams) -> anyhow::Result<()> {
        let key = serialize(&swap_id)?;
        let value = serialize(&Swap::new(params)).context("could not serialize new swap")?;

        self.db
            .compare_and_swap(key, Option::<Vec<u8>>::None, Some(value))
            .context("could not write in the DB")?
            .context("swap is already stored")?;

        self.flush().await
    }

    pub fn get_swap(&self, swap_id: &SwapId) -> anyhow::Result<Swap> {
        let key = serialize(swap_id)?;

        let swap = self
            .db
            .get(&key)?
            .ok_or_else(|| anyhow!("swap does not exist {}", swap_id))?;

        deserialize(&swap).context("could not deserialize swap")
    }

    pub fn all_swaps(&self) -> anyhow::Result<Vec<(SwapId, Swap)>> {
        self.db
            .iter()
            .filter_map(|item| match item {
                Ok((key, value)) => {
                    let swap_id = deserialize::<SwapId>(&key);
                    let swap = deserialize::<Swap>(&value).context("could not deserialize swap");

                    match (swap_id, swap) {
                        (Ok(swap_id), Ok(swap)) => Some(Ok((swap_id, swap))),
                        (Ok(_), Err(err)) => Some(Err(err)), // If the key deserializes,
                        // the value should be a swap
                        (..) => None, // This is not a swap item
                    }
                }
                Err(err) => Some(Err(err).context("could not retrieve data")),
            })
            .collect()
    }

    async fn update_swap(&self, swap_id: &SwapId, old: Swap, new: Swap) -> anyhow::Result<()> {
        let key = serialize(swap_id)?;
        let old_value = serialize(&old).context("could not serialize old swap value")?;
        let new_value = serialize(&new).context("could not serialize new swap value")?;

        self.db
            .compare_and_swap(key, Some(old_value), Some(new_value))
            .context("could not write in the DB")?
            .context("stored swap somehow changed, aborting saving")?;

        self.flush().await
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.db
            .flush_async()
            .await
            .map(|_| ())
            .context("could not flush db")
    }
}

pub fn serialize<T>(t: &T) -> anyhow::Result<Vec<u8>>
where
    T: Serialize,
{
    Ok(serde_cbor::to_vec(t)?)
}

pub fn deserialize<'a, T>(v: &'a [u8]) -> anyhow::Result<T>
where
    T: Deserialize<'a>,
{
    Ok(serde_cbor::from_slice(v)?)
}

/// The full persisted state of one swap.
///
/// Every step's output is a separate optional record; a field, once
/// populated, is never cleared or overwritten, so the resume point can be
/// derived from what is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub params: SwapParams,
    pub commitment: Option<Commitment>,
    pub funded: Option<Funded>,
    pub opened: Option<Opened>,
    pub eos_withdrawn: Option<EosWithdrawn>,
    pub btc_withdrawn: Option<BtcWithdrawn>,
    pub refunded: Option<Refunded>,
}

impl Swap {
    pub fn new(params: SwapParams) -> Self {
        Swap {
            params,
            commitment: None,
            funded: None,
            opened: None,
            eos_withdrawn: None,
            btc_withdrawn: None,
            refunded: None,
        }
    }

    pub fn is_refunded(&self) -> bool {
        self.refunded.is_some()
    }
}

/// The secret/hash pair the swap commits to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub secret: Secret,
    pub secret_hash: SecretHash,
}

/// The funded Bitcoin script and its funding transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Funded {
    pub script_values: bitcoin::ScriptValues,
    pub create_tx: bitcoin::TxId,
}

/// The counterparty's acknowledgement that the swap is open on its contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opened {
    pub open_tx: eos::TxId,
    pub shared_swap_id: SharedSwapId,
}

/// Our withdrawal on the EOS chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EosWithdrawn {
    pub transaction: eos::TxId,
}

/// The counterparty's withdrawal on the Bitcoin chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BtcWithdrawn {
    pub transaction: bitcoin::TxId,
}

/// The refund of our Bitcoin script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Refunded {
    pub transaction: bitcoin::TxId,
}

#[async_trait::async_trait]
impl Save<Commitment> for Database {
    async fn save(&self, event: Commitment, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.commitment {
            Some(_) => Err(anyhow!("commitment is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.commitment = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<Commitment> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<Commitment>> {
        Ok(self.get_swap(&swap_id)?.commitment)
    }
}

#[async_trait::async_trait]
impl Save<Funded> for Database {
    async fn save(&self, event: Funded, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.funded {
            Some(_) => Err(anyhow!("funded event is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.funded = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<Funded> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<Funded>> {
        Ok(self.get_swap(&swap_id)?.funded)
    }
}

#[async_trait::async_trait]
impl Save<Opened> for Database {
    async fn save(&self, event: Opened, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.opened {
            Some(_) => Err(anyhow!("opened event is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.opened = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<Opened> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<Opened>> {
        Ok(self.get_swap(&swap_id)?.opened)
    }
}

#[async_trait::async_trait]
impl Save<EosWithdrawn> for Database {
    async fn save(&self, event: EosWithdrawn, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.eos_withdrawn {
            Some(_) => Err(anyhow!("eos withdrawn event is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.eos_withdrawn = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<EosWithdrawn> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<EosWithdrawn>> {
        Ok(self.get_swap(&swap_id)?.eos_withdrawn)
    }
}

#[async_trait::async_trait]
impl Save<BtcWithdrawn> for Database {
    async fn save(&self, event: BtcWithdrawn, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.btc_withdrawn {
            Some(_) => Err(anyhow!("btc withdrawn event is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.btc_withdrawn = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<BtcWithdrawn> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<BtcWithdrawn>> {
        Ok(self.get_swap(&swap_id)?.btc_withdrawn)
    }
}

#[async_trait::async_trait]
impl Save<Refunded> for Database {
    async fn save(&self, event: Refunded, swap_id: SwapId) -> anyhow::Result<()> {
        let stored_swap = self.get_swap(&swap_id)?;

        match stored_swap.refunded {
            Some(_) => Err(anyhow!("refunded event is already stored")),
            None => {
                let mut swap = stored_swap.clone();
                swap.refunded = Some(event);

                self.update_swap(&swap_id, stored_swap, swap).await
            }
        }
    }
}

impl Load<Refunded> for Database {
    fn load(&self, swap_id: SwapId) -> anyhow::Result<Option<Refunded>> {
        Ok(self.get_swap(&swap_id)?.refunded)
    }
}
