//! The peer channel between the two swap participants, scoped to one swap.
//!
//! The transport itself (and the wire encoding of messages on it) is owned by
//! the host; the flow only relies on the semantics of [`Room`].

use crate::{
    bitcoin,
    database::Swap,
    eos,
    secret::{Secret, SecretHash},
    swap_id::SharedSwapId,
};
use anyhow::Context as _;
use futures::channel::{mpsc, oneshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The protocol messages the Bitcoin-funding role sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Ask the counterparty to open the swap on its contract.
    RequestOpenSwap,
    /// Announce the funded script so the counterparty can verify it.
    CreateBtcScript {
        script_values: bitcoin::ScriptValues,
        create_tx: bitcoin::TxId,
    },
    /// Ask the counterparty to (re-)announce its BTC withdrawal.
    RequestBtcWithdraw,
    /// Announce our EOS withdrawal; this reveals the secret to the
    /// counterparty.
    EosWithdraw {
        eos_withdraw_tx: eos::TxId,
        secret: Secret,
    },
}

impl Message {
    /// The `create btc script` announcement, projected from the persisted
    /// record.
    pub fn create_btc_script(swap: &Swap) -> anyhow::Result<Message> {
        let funded = swap
            .funded
            .clone()
            .context("btc script has not been funded")?;

        Ok(Message::CreateBtcScript {
            script_values: funded.script_values,
            create_tx: funded.create_tx,
        })
    }

    /// The `eos withdraw` announcement, projected from the persisted record.
    pub fn eos_withdraw(swap: &Swap) -> anyhow::Result<Message> {
        let withdrawn = swap
            .eos_withdrawn
            .clone()
            .context("eos has not been withdrawn")?;
        let commitment = swap.commitment.context("no secret has been recorded")?;

        Ok(Message::EosWithdraw {
            eos_withdraw_tx: withdrawn.transaction,
            secret: commitment.secret,
        })
    }
}

/// The events the counterparty or the coordination layer delivers to us.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The secret/hash pair this swap commits to.
    SubmitSecret {
        secret: Secret,
        secret_hash: SecretHash,
    },
    /// The counterparty opened the swap on its contract.
    OpenSwap {
        open_tx: eos::TxId,
        swap_id: SharedSwapId,
    },
    /// The counterparty withdrew the BTC locked in our script.
    BtcWithdraw { btc_withdraw_tx: bitcoin::TxId },
    /// The counterparty asks us to re-announce the funded script.
    RequestCreateBtcScript,
    /// The counterparty asks us to re-announce our EOS withdrawal.
    RequestEosWithdraw,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SubmitSecret { .. } => EventKind::SubmitSecret,
            Event::OpenSwap { .. } => EventKind::OpenSwap,
            Event::BtcWithdraw { .. } => EventKind::BtcWithdraw,
            Event::RequestCreateBtcScript => EventKind::RequestCreateBtcScript,
            Event::RequestEosWithdraw => EventKind::RequestEosWithdraw,
        }
    }
}

/// Names of the events a subscription can be made for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SubmitSecret,
    OpenSwap,
    BtcWithdraw,
    RequestCreateBtcScript,
    RequestEosWithdraw,
}

/// An event arrived whose payload does not belong to the awaited kind.
#[derive(Clone, Copy, Debug, Error)]
#[error("expected {expected:?} event, got {got:?}")]
pub struct UnexpectedEvent {
    pub expected: EventKind,
    pub got: EventKind,
}

#[async_trait::async_trait]
pub trait Room: Send + Sync + 'static {
    /// Send a protocol message to the peer.
    async fn send(&self, message: Message) -> anyhow::Result<()>;

    /// Register interest in the next event of the given kind.
    ///
    /// The returned receiver resolves with the first matching event delivered
    /// after registration and never again; events of the same kind arriving
    /// before the next registration are dropped.
    async fn next_event(&self, kind: EventKind) -> oneshot::Receiver<Event>;

    /// Subscribe to every future event of the given kind.
    async fn subscribe(&self, kind: EventKind) -> mpsc::Receiver<Event>;
}
