use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

const LENGTH: usize = 32;

/// The random preimage this swap commits to.
///
/// Revealing it to claim the EOS necessarily allows the counterparty to claim
/// the BTC; the on-chain scripts verify its sha256 digest.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Secret([u8; LENGTH]);

impl Secret {
    pub fn random() -> Self {
        let mut bytes = [0u8; LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Secret(bytes)
    }

    pub fn hash(&self) -> SecretHash {
        SecretHash::new(*self)
    }

    pub fn into_raw(self) -> [u8; LENGTH] {
        self.0
    }
}

impl From<[u8; LENGTH]> for Secret {
    fn from(bytes: [u8; LENGTH]) -> Self {
        Secret(bytes)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SecretHash([u8; LENGTH]);

impl SecretHash {
    pub fn new(secret: Secret) -> Self {
        let digest: [u8; LENGTH] = Sha256::digest(secret.0).into();
        SecretHash(digest)
    }

    pub fn as_bytes(&self) -> &[u8; LENGTH] {
        &self.0
    }
}

impl From<[u8; LENGTH]> for SecretHash {
    fn from(bytes: [u8; LENGTH]) -> Self {
        SecretHash(bytes)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FromStrError {
    #[error("expected {expected} hex-encoded bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid hex encoding")]
    Hex(#[from] hex::FromHexError),
}

fn bytes_from_str(s: &str) -> Result<[u8; LENGTH], FromStrError> {
    let vec = hex::decode(s)?;
    if vec.len() != LENGTH {
        return Err(FromStrError::InvalidLength {
            expected: LENGTH,
            got: vec.len(),
        });
    }

    let mut bytes = [0u8; LENGTH];
    bytes.copy_from_slice(&vec);
    Ok(bytes)
}

impl FromStr for Secret {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bytes_from_str(s).map(Secret)
    }
}

impl FromStr for SecretHash {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bytes_from_str(s).map(SecretHash)
    }
}

impl fmt::LowerHex for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::LowerHex for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self)
    }
}

// The preimage must not leak into logs, only its hash is printable.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([redacted])")
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:x}", self))
    }
}

impl Serialize for SecretHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:x}", self))
    }
}

struct HexVisitor<T>(std::marker::PhantomData<T>);

impl<'de, T> de::Visitor<'de> for HexVisitor<T>
where
    T: FromStr<Err = FromStrError>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a hex encoded 32 byte value")
    }

    fn visit_str<E>(self, v: &str) -> Result<T, E>
    where
        E: de::Error,
    {
        T::from_str(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &"hex encoded 32 bytes"))
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HexVisitor(std::marker::PhantomData))
    }
}

impl<'de> Deserialize<'de> for SecretHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HexVisitor(std::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_secret_hash_as_hex() {
        let bytes = b"hello world, you are beautiful!!";
        let secret = Secret::from(*bytes);

        assert_eq!(
            secret.hash().to_string(),
            "68d627971643a6f97f27c58957826fcba853ec2077fd10ec6b93d8e61deb4cec"
        );
    }

    #[test]
    fn random_secrets_differ() {
        let zeroes = Secret::from([0u8; 32]);

        let secret = Secret::random();

        assert_ne!(secret, zeroes);
        assert_ne!(Secret::random(), secret);
    }

    #[test]
    fn round_trip_secret_serialization() {
        let secret = Secret::random();

        let json = serde_json::to_string(&secret).unwrap();
        let deserialized = serde_json::from_str::<Secret>(&json).unwrap();

        assert_eq!(deserialized, secret);
    }

    #[test]
    fn round_trip_secret_hash_serialization() {
        let hash = Secret::random().hash();

        let json = serde_json::to_string(&hash).unwrap();
        let deserialized = serde_json::from_str::<SecretHash>(&json).unwrap();

        assert_eq!(deserialized, hash);
    }

    #[test]
    fn invalid_length_from_str() {
        let result =
            Secret::from_str("68d627971643a6f97f27c58957826fcba853ec2077fd10ec6b93d8e61deb4c");

        assert_eq!(
            result.unwrap_err(),
            FromStrError::InvalidLength {
                expected: 32,
                got: 31
            }
        );
    }
}
