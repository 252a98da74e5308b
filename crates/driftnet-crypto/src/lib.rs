//! Candidate key generation and probe fingerprint derivation.
//!
//! A probe candidate is one random secp256k1 keypair. From its compressed
//! public key the four shapes an output could have locked funds to are
//! derived: the key itself, its hash-160, the `P2WSH` program of the
//! canonical pay-to-pubkey script, and the hash-160 of the nested-segwit
//! redeem script.

use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use sha2::{Digest, Sha256};

/// One randomly drawn keypair under test.
pub struct Candidate {
    secret: SecretKey,
    public: PublicKey,
}

impl Candidate {
    /// Draw a fresh keypair from OS randomness.
    pub fn random<C: Signing>(secp: &Secp256k1<C>) -> Self {
        let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
        Self { secret, public }
    }

    /// Rebuild a candidate from raw secret key bytes.
    pub fn from_secret_bytes<C: Signing>(
        secp: &Secp256k1<C>,
        bytes: &[u8; 32],
    ) -> Result<Self, secp256k1::Error> {
        let secret = SecretKey::from_slice(bytes)?;
        let public = PublicKey::from_secret_key(secp, &secret);
        Ok(Self { secret, public })
    }

    /// The four probe shapes of this candidate's public key.
    pub fn fingerprints(&self) -> Fingerprints {
        Fingerprints::of(&self.public)
    }

    /// The secret key as lowercase hex, for the jackpot report.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }

    /// The legacy base58check address of the compressed public key.
    pub fn p2pkh_address(&self) -> String {
        bitcoin::Address::p2pkh(bitcoin::PublicKey::new(self.public), bitcoin::Network::Bitcoin)
            .to_string()
    }
}

/// The four probe shapes derived from one compressed public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprints {
    /// The 33-byte compressed public key (`P2PK`, and the `P2PKU` surrogate).
    pub pub_key: [u8; 33],
    /// `hash160(pubkey)`: `P2PKH` and `P2WPKH`.
    pub pubkey_hash: [u8; 20],
    /// `sha256(0x21 ‖ pubkey ‖ OP_CHECKSIG)`: the `P2WSH` program of the
    /// canonical pay-to-pubkey script.
    pub p2pk_witness: [u8; 32],
    /// `hash160(0x0014 ‖ hash160(pubkey))`: `P2SH`-nested `P2WPKH`.
    pub nested_pubkey_hash: [u8; 20],
}

impl Fingerprints {
    pub fn of(public: &PublicKey) -> Self {
        let pub_key = public.serialize();
        let pubkey_hash = hash160(&pub_key);

        let mut p2pk_script = [0u8; 35];
        p2pk_script[0] = 0x21;
        p2pk_script[1..34].copy_from_slice(&pub_key);
        p2pk_script[34] = 0xac;
        let p2pk_witness: [u8; 32] = Sha256::digest(p2pk_script).into();

        let mut redeem_script = [0u8; 22];
        redeem_script[1] = 0x14;
        redeem_script[2..].copy_from_slice(&pubkey_hash);
        let nested_pubkey_hash = hash160(&redeem_script);

        Self {
            pub_key,
            pubkey_hash,
            p2pk_witness,
            nested_pubkey_hash,
        }
    }
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}
