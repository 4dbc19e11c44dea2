// Randomness coordinator integration for the upkeep raffle
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{hash::hashv, msg, pubkey::Pubkey};

use crate::{constants::REQUEST_ID_DOMAIN, error::RaffleError, state::RandomnessParams};

/// A 256-bit random value, little-endian
pub type RandomWord = [u8; 32];

/// Widen a `u64` into a random word
pub fn random_word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[..8].copy_from_slice(&value.to_le_bytes());
    word
}

/// `word mod modulus` over the full 256 bits
pub fn word_mod(word: &RandomWord, modulus: u64) -> u64 {
    debug_assert!(modulus > 0);
    let modulus = modulus as u128;
    word.iter()
        .rev()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus) as u64
}

/// Ticket index selected by `word`, or `None` when there are no tickets
pub fn winner_index(word: &RandomWord, tickets: usize) -> Option<usize> {
    if tickets == 0 {
        return None;
    }
    Some(word_mod(word, tickets as u64) as usize)
}

/// Everything the coordinator needs to serve one request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// Per-raffle request counter
    pub nonce: u64,
}

impl RandomnessRequest {
    pub fn new(params: &RandomnessParams, nonce: u64) -> Self {
        Self {
            key_hash: params.key_hash,
            subscription_id: params.subscription_id,
            request_confirmations: params.request_confirmations,
            callback_gas_limit: params.callback_gas_limit,
            num_words: params.num_words,
            nonce,
        }
    }
}

/// Outbound half of the randomness protocol.
///
/// Issuing a request returns its correlation id immediately; the random words
/// arrive later through a separate fulfillment call carrying that id.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError>;
}

/// On-chain oracle client.
///
/// Derives the request id from the requesting raffle and the request contents
/// and logs the request so the off-chain coordinator can pick it up.
pub struct CoordinatorOracle {
    requester: Pubkey,
}

impl CoordinatorOracle {
    pub fn new(requester: Pubkey) -> Self {
        Self { requester }
    }

    pub fn request_id(&self, request: &RandomnessRequest) -> u64 {
        let hash = hashv(&[
            REQUEST_ID_DOMAIN,
            self.requester.as_ref(),
            &request.key_hash,
            &request.subscription_id.to_le_bytes(),
            &request.nonce.to_le_bytes(),
        ])
        .to_bytes();
        u64::from_le_bytes(*array_ref![hash, 0, 8])
    }
}

impl RandomnessOracle for CoordinatorOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, RaffleError> {
        let request_id = self.request_id(request);
        msg!(
            "RandomWordsRequested: requester={}, request_id={}, subscription_id={}, confirmations={}, callback_gas_limit={}, num_words={}",
            self.requester,
            request_id,
            request.subscription_id,
            request.request_confirmations,
            request.callback_gas_limit,
            request.num_words
        );
        Ok(request_id)
    }
}
