//! Execute the Bitcoin-funding side of a BTC to EOS swap.
//!
//! The flow is a fixed sequence of five steps. Each step persists its output
//! before the next one starts, and the next step to run is derived from which
//! outputs are already recorded, so a restarted flow picks up exactly where
//! the previous process stopped.

use crate::{
    bitcoin::{self, ExecuteFund, ExecuteRefund, OwnerIdentity, ScriptHash, ScriptValues},
    database::{
        BtcWithdrawn, Commitment, Database, EosWithdrawn, Funded, Opened, Refunded, Save, Swap,
    },
    eos::{self, ExecuteWithdraw, GetLockPeriod},
    room::{Event, EventKind, Message, Room, UnexpectedEvent},
    swap_id::SwapId,
    timestamp::{btc_lock_time, Timestamp},
};
use anyhow::{Context as _, Result};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tracing_futures::Instrument;

/// Swap metadata fixed when the swap is negotiated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Amount to lock in the Bitcoin script, in satoshi.
    pub amount: bitcoin::Amount,
    /// The counterparty's Bitcoin public key, owning the script's redeem
    /// branch.
    pub counterparty_public_key: bitcoin::PublicKey,
    /// The EOS account whose locked funds we withdraw.
    pub counterparty_account: eos::Account,
}

/// One unit of the flow's forward progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    AwaitSecret,
    FundBtcScript,
    AwaitOpenSwap,
    WithdrawEos,
    AwaitBtcWithdraw,
}

impl Step {
    /// The first step whose output is missing from the record, `None` once
    /// the swap is complete.
    ///
    /// Progress and state are the same thing: there is no separate step
    /// counter that could fall out of sync with the record.
    pub fn next(swap: &Swap) -> Option<Step> {
        if swap.commitment.is_none() {
            Some(Step::AwaitSecret)
        } else if swap.funded.is_none() {
            Some(Step::FundBtcScript)
        } else if swap.opened.is_none() {
            Some(Step::AwaitOpenSwap)
        } else if swap.eos_withdrawn.is_none() {
            Some(Step::WithdrawEos)
        } else if swap.btc_withdrawn.is_none() {
            Some(Step::AwaitBtcWithdraw)
        } else {
            None
        }
    }
}

/// The submitted secret does not hash to the submitted commitment.
#[derive(Clone, Copy, Debug, Error)]
#[error("submitted secret does not match the submitted secret hash")]
pub struct HashMismatch;

/// The requests the passive listener can answer once the matching state
/// exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ListenRequest {
    CreateBtcScript,
    EosWithdraw,
}

impl ListenRequest {
    fn event_kind(self) -> EventKind {
        match self {
            ListenRequest::CreateBtcScript => EventKind::RequestCreateBtcScript,
            ListenRequest::EosWithdraw => EventKind::RequestEosWithdraw,
        }
    }
}

/// Everything needed to drive one swap: the peer channel, the two ledger
/// modules, the local identity and the database.
pub struct Seller<R, BW, EW, ID> {
    room: Arc<R>,
    btc_wallet: Arc<BW>,
    eos_wallet: Arc<EW>,
    identity: Arc<ID>,
    db: Arc<Database>,
    swap_id: SwapId,
    registered: Mutex<HashSet<ListenRequest>>,
}

impl<R, BW, EW, ID> fmt::Debug for Seller<R, BW, EW, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seller")
            .field("swap_id", &self.swap_id)
            .finish()
    }
}

impl<R, BW, EW, ID> Seller<R, BW, EW, ID>
where
    R: Room,
    BW: ExecuteFund + ExecuteRefund + Send + Sync + 'static,
    EW: GetLockPeriod + ExecuteWithdraw + Send + Sync + 'static,
    ID: OwnerIdentity + Send + Sync + 'static,
{
    pub fn new(
        room: Arc<R>,
        btc_wallet: Arc<BW>,
        eos_wallet: Arc<EW>,
        identity: Arc<ID>,
        db: Arc<Database>,
        swap_id: SwapId,
    ) -> Self {
        Seller {
            room,
            btc_wallet,
            eos_wallet,
            identity,
            db,
            swap_id,
            registered: Mutex::new(HashSet::new()),
        }
    }

    /// Drive the swap forward until it completes.
    ///
    /// Steps run strictly in order; steps whose output is already recorded
    /// are skipped, never re-executed. A failing step halts the flow without
    /// recording anything; rerunning resumes at that same step.
    pub async fn run(&self) -> Result<()> {
        loop {
            let swap = self.db.get_swap(&self.swap_id)?;

            let step = match Step::next(&swap) {
                Some(step) => step,
                None => {
                    tracing::info!(swap_id = %self.swap_id, "swap finished successfully");
                    return Ok(());
                }
            };

            match step {
                Step::AwaitSecret => self.await_secret().await?,
                Step::FundBtcScript => self.fund_btc_script(&swap).await?,
                Step::AwaitOpenSwap => self.await_open_swap().await?,
                Step::WithdrawEos => self.withdraw_eos(&swap).await?,
                Step::AwaitBtcWithdraw => self.await_btc_withdraw().await?,
            }
        }
    }

    /// Step 1: wait for the secret/hash pair this swap commits to.
    async fn await_secret(&self) -> Result<()> {
        match self.next_event(EventKind::SubmitSecret, None).await? {
            Event::SubmitSecret {
                secret,
                secret_hash,
            } => {
                if secret.hash() != secret_hash {
                    return Err(HashMismatch.into());
                }

                self.db
                    .save(
                        Commitment {
                            secret,
                            secret_hash,
                        },
                        self.swap_id,
                    )
                    .await?;
                tracing::info!("commitment recorded");

                Ok(())
            }
            other => Err(unexpected(EventKind::SubmitSecret, &other)),
        }
    }

    /// Step 2: fund the Bitcoin script and announce it to the counterparty.
    async fn fund_btc_script(&self, swap: &Swap) -> Result<()> {
        let commitment = swap
            .commitment
            .context("cannot fund the script before the commitment is recorded")?;

        let lock_period = self.eos_wallet.lock_period().await?;
        let script_values = ScriptValues {
            secret_hash: commitment.secret_hash,
            owner_public_key: self.identity.owner_public_key(),
            recipient_public_key: swap.params.counterparty_public_key.clone(),
            lock_time: btc_lock_time(Timestamp::now(), lock_period),
        };

        // The swap scripts verify the secret with sha256, not the wallet's
        // default digest.
        let create_tx = self
            .btc_wallet
            .execute_fund(&script_values, swap.params.amount, ScriptHash::Sha256)
            .await?;

        self.db
            .save(
                Funded {
                    script_values,
                    create_tx,
                },
                self.swap_id,
            )
            .await?;
        tracing::info!("btc script funded");

        self.send_btc_script().await
    }

    /// Step 3: ask the counterparty to open the swap on its contract and wait
    /// for the acknowledgement.
    async fn await_open_swap(&self) -> Result<()> {
        match self
            .next_event(EventKind::OpenSwap, Some(Message::RequestOpenSwap))
            .await?
        {
            Event::OpenSwap { open_tx, swap_id } => {
                self.db
                    .save(
                        Opened {
                            open_tx,
                            shared_swap_id: swap_id,
                        },
                        self.swap_id,
                    )
                    .await?;
                tracing::info!("counterparty opened the swap");

                Ok(())
            }
            other => Err(unexpected(EventKind::OpenSwap, &other)),
        }
    }

    /// Step 4: withdraw the EOS with the secret. From here on the
    /// counterparty can complete its own withdrawal.
    async fn withdraw_eos(&self, swap: &Swap) -> Result<()> {
        let commitment = swap
            .commitment
            .context("cannot withdraw before the commitment is recorded")?;

        let transaction = self
            .eos_wallet
            .execute_withdraw(&swap.params.counterparty_account, commitment.secret)
            .await?;

        self.db
            .save(EosWithdrawn { transaction }, self.swap_id)
            .await?;
        tracing::info!("eos withdrawn, secret is public");

        self.send_eos_withdraw().await
    }

    /// Step 5: wait for the counterparty to withdraw the BTC locked in our
    /// script.
    async fn await_btc_withdraw(&self) -> Result<()> {
        match self
            .next_event(EventKind::BtcWithdraw, Some(Message::RequestBtcWithdraw))
            .await?
        {
            Event::BtcWithdraw { btc_withdraw_tx } => {
                self.db
                    .save(
                        BtcWithdrawn {
                            transaction: btc_withdraw_tx,
                        },
                        self.swap_id,
                    )
                    .await?;
                tracing::info!("counterparty withdrew the btc");

                Ok(())
            }
            other => Err(unexpected(EventKind::BtcWithdraw, &other)),
        }
    }

    /// Reclaim the funds locked in the Bitcoin script.
    ///
    /// Available as soon as the script is funded, regardless of how far the
    /// flow has progressed. The caller is responsible for invoking this only
    /// once the script's lock time has passed.
    pub async fn try_refund(&self) -> Result<bitcoin::TxId> {
        let swap = self.db.get_swap(&self.swap_id)?;
        let funded = swap
            .funded
            .context("cannot refund before the script is funded")?;
        let commitment = swap
            .commitment
            .context("cannot refund without the recorded secret")?;

        let transaction = self
            .btc_wallet
            .execute_refund(&funded.script_values, commitment.secret)
            .await?;

        self.db
            .save(
                Refunded {
                    transaction: transaction.clone(),
                },
                self.swap_id,
            )
            .await?;
        tracing::info!(swap_id = %self.swap_id, "btc script refunded");

        Ok(transaction)
    }

    /// Wait for the next event of the given kind, optionally nudging the peer
    /// with a request message.
    ///
    /// The subscription is registered before the request goes out so an
    /// immediate answer cannot be missed.
    async fn next_event(&self, kind: EventKind, request: Option<Message>) -> Result<Event> {
        self.update_listen_requests().await?;

        let receiver = self.room.next_event(kind).await;

        if let Some(request) = request {
            self.room.send(request).await?;
        }

        receiver
            .await
            .with_context(|| format!("room closed while waiting for {:?} event", kind))
    }

    /// Re-announce the answers this node can serve, registering each request
    /// listener at most once per swap.
    ///
    /// Safe to call any number of times; it is invoked before every wait so
    /// that a restarted flow starts answering replay requests again.
    async fn update_listen_requests(&self) -> Result<()> {
        let swap = self.db.get_swap(&self.swap_id)?;

        if swap.funded.is_some() {
            self.listen(ListenRequest::CreateBtcScript).await;
        }
        if swap.commitment.is_some() && swap.eos_withdrawn.is_some() {
            self.listen(ListenRequest::EosWithdraw).await;
        }

        Ok(())
    }

    async fn listen(&self, request: ListenRequest) {
        {
            let mut registered = self
                .registered
                .lock()
                .expect("listener registry lock poisoned");
            if !registered.insert(request) {
                return;
            }
        }

        let mut requests = self.room.subscribe(request.event_kind()).await;
        let room = Arc::clone(&self.room);
        let db = Arc::clone(&self.db);
        let swap_id = self.swap_id;

        let task = async move {
            // The persisted record is the source of truth for every answer,
            // not whatever was in memory at registration time.
            while requests.next().await.is_some() {
                let message = db.get_swap(&swap_id).and_then(|swap| match request {
                    ListenRequest::CreateBtcScript => Message::create_btc_script(&swap),
                    ListenRequest::EosWithdraw => Message::eos_withdraw(&swap),
                });

                match message {
                    Ok(message) => {
                        if let Err(e) = room.send(message).await {
                            tracing::warn!("failed to answer {:?}: {:#}", request, e);
                        }
                    }
                    Err(e) => tracing::warn!("failed to answer {:?}: {:#}", request, e),
                }
            }
        };

        tokio::spawn(task.instrument(tracing::error_span!("listen_requests", %swap_id)));
    }

    async fn send_btc_script(&self) -> Result<()> {
        let swap = self.db.get_swap(&self.swap_id)?;
        self.room.send(Message::create_btc_script(&swap)?).await
    }

    async fn send_eos_withdraw(&self) -> Result<()> {
        let swap = self.db.get_swap(&self.swap_id)?;
        self.room.send(Message::eos_withdraw(&swap)?).await
    }
}

fn unexpected(expected: EventKind, got: &Event) -> anyhow::Error {
    UnexpectedEvent {
        expected,
        got: got.kind(),
    }
    .into()
}
