//! `quickcheck::Arbitrary` impls for property tests.

use crate::{
    bitcoin,
    database::{Commitment, Funded},
    eos,
    secret::Secret,
    swap::SwapParams,
    timestamp::{RelativeTime, Timestamp},
};
use quickcheck::{Arbitrary, Gen};

fn hex_string(g: &mut Gen, len: usize) -> String {
    let bytes: Vec<u8> = (0..len).map(|_| u8::arbitrary(g)).collect();
    hex::encode(bytes)
}

impl Arbitrary for Secret {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut bytes = [0u8; 32];
        for byte in &mut bytes {
            *byte = u8::arbitrary(g);
        }
        Secret::from(bytes)
    }
}

impl Arbitrary for Timestamp {
    fn arbitrary(g: &mut Gen) -> Self {
        Timestamp::from(u32::arbitrary(g))
    }
}

impl Arbitrary for RelativeTime {
    fn arbitrary(g: &mut Gen) -> Self {
        RelativeTime::from(u32::arbitrary(g))
    }
}

impl Arbitrary for bitcoin::Amount {
    fn arbitrary(g: &mut Gen) -> Self {
        bitcoin::Amount::from_sat(u64::arbitrary(g))
    }
}

impl Arbitrary for bitcoin::PublicKey {
    fn arbitrary(g: &mut Gen) -> Self {
        bitcoin::PublicKey::from(hex_string(g, 33))
    }
}

impl Arbitrary for bitcoin::TxId {
    fn arbitrary(g: &mut Gen) -> Self {
        bitcoin::TxId::from(hex_string(g, 32))
    }
}

impl Arbitrary for bitcoin::ScriptValues {
    fn arbitrary(g: &mut Gen) -> Self {
        bitcoin::ScriptValues {
            secret_hash: Secret::arbitrary(g).hash(),
            owner_public_key: bitcoin::PublicKey::arbitrary(g),
            recipient_public_key: bitcoin::PublicKey::arbitrary(g),
            lock_time: Timestamp::arbitrary(g),
        }
    }
}

impl Arbitrary for eos::Account {
    fn arbitrary(g: &mut Gen) -> Self {
        let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz12345".chars().collect();
        let name: String = (0..12)
            .map(|_| *g.choose(&alphabet).expect("alphabet is not empty"))
            .collect();

        eos::Account::from(name)
    }
}

impl Arbitrary for eos::TxId {
    fn arbitrary(g: &mut Gen) -> Self {
        eos::TxId::from(hex_string(g, 32))
    }
}

impl Arbitrary for SwapParams {
    fn arbitrary(g: &mut Gen) -> Self {
        SwapParams {
            amount: bitcoin::Amount::arbitrary(g),
            counterparty_public_key: bitcoin::PublicKey::arbitrary(g),
            counterparty_account: eos::Account::arbitrary(g),
        }
    }
}

impl Arbitrary for Commitment {
    fn arbitrary(g: &mut Gen) -> Self {
        let secret = Secret::arbitrary(g);

        Commitment {
            secret,
            secret_hash: secret.hash(),
        }
    }
}

impl Arbitrary for Funded {
    fn arbitrary(g: &mut Gen) -> Self {
        Funded {
            script_values: bitcoin::ScriptValues::arbitrary(g),
            create_tx: bitcoin::TxId::arbitrary(g),
        }
    }
}
