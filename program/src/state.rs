// Upkeep Raffle Program - State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    borsh::try_from_slice_unchecked,
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{constants::*, error::RaffleError};

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// A randomness request is outstanding
    Calculating,
}

impl Default for RaffleState {
    fn default() -> Self {
        RaffleState::Open
    }
}

/// Parameters forwarded to the coordinator on every randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessParams {
    /// The only signer allowed to fulfill requests
    pub coordinator: Pubkey,
    /// Key (gas lane) the coordinator answers with
    pub key_hash: [u8; 32],
    /// Funding subscription with the coordinator
    pub subscription_id: u64,
    /// Confirmations the coordinator waits before answering
    pub request_confirmations: u16,
    /// Compute budget reserved for the fulfillment
    pub callback_gas_limit: u32,
    /// Random words per request, always `NUM_WORDS`
    pub num_words: u32,
}

impl RandomnessParams {
    pub const LEN: usize = 32 + 32 + 8 + 2 + 4 + 4;
}

/// Raffle configuration, fixed when the raffle is created
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum lamports paid per ticket
    pub entrance_fee: u64,
    /// Seconds that must pass between draws
    pub interval: i64,
    /// Ticket capacity the account is sized for
    pub max_players: u32,
    pub randomness: RandomnessParams,
}

impl RaffleConfig {
    pub const LEN: usize = 8 + 8 + 4 + RandomnessParams::LEN;

    pub fn validate(&self) -> Result<(), RaffleError> {
        let randomness = &self.randomness;
        if self.entrance_fee == 0 {
            msg!("Entrance fee must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        if self.interval <= 0 {
            msg!("Interval must be positive");
            return Err(RaffleError::InvalidConfig);
        }
        if self.max_players == 0 || self.max_players > MAX_PLAYERS {
            msg!("Max players must be between 1 and {}", MAX_PLAYERS);
            return Err(RaffleError::InvalidConfig);
        }
        if randomness.num_words != NUM_WORDS {
            msg!("Exactly {} random word is requested per draw", NUM_WORDS);
            return Err(RaffleError::InvalidConfig);
        }
        if randomness.request_confirmations == 0
            || randomness.request_confirmations > MAX_REQUEST_CONFIRMATIONS
        {
            msg!(
                "Request confirmations must be between 1 and {}",
                MAX_REQUEST_CONFIRMATIONS
            );
            return Err(RaffleError::InvalidConfig);
        }
        if randomness.callback_gas_limit == 0 {
            msg!("Callback gas limit must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        if randomness.coordinator == Pubkey::default() {
            msg!("Coordinator must be set");
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            entrance_fee: DEFAULT_ENTRANCE_FEE,
            interval: DEFAULT_INTERVAL,
            max_players: DEFAULT_MAX_PLAYERS,
            randomness: RandomnessParams {
                // Placeholder; a real coordinator must be set before use
                coordinator: Pubkey::default(),
                key_hash: [0u8; 32],
                subscription_id: 0,
                request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
                callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
                num_words: NUM_WORDS,
            },
        }
    }
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Creator of the raffle; only used for address derivation
    pub authority: Pubkey,
    /// Distinguishes raffles created by the same authority
    pub nonce: u64,
    pub bump: u8,
    pub config: RaffleConfig,
    pub state: RaffleState,
    /// One entry per ticket, in entry order
    pub players: Vec<Pubkey>,
    /// Lamports collected since the last payout
    pub pool: u64,
    /// Time the last round concluded (creation time before the first draw)
    pub last_timestamp: UnixTimestamp,
    pub recent_winner: Option<Pubkey>,
    /// Id of the outstanding randomness request, if any
    pub pending_request: Option<u64>,
    /// Number of randomness requests issued so far
    pub request_nonce: u64,
    pub rounds_completed: u64,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Serialized size with no players and every optional field populated
    pub const BASE_LEN: usize = 1 // is_initialized
        + 32 // authority
        + 8 // nonce
        + 1 // bump
        + RaffleConfig::LEN
        + 1 // state
        + 4 // players length prefix
        + 8 // pool
        + 8 // last_timestamp
        + 1 + 32 // recent_winner
        + 1 + 8 // pending_request
        + 8 // request_nonce
        + 8; // rounds_completed

    /// Account size needed to hold `max_players` tickets
    pub fn space(max_players: u32) -> usize {
        Self::BASE_LEN + 32 * max_players as usize
    }

    /// Create a fresh, open raffle
    pub fn new(
        authority: Pubkey,
        nonce: u64,
        bump: u8,
        config: RaffleConfig,
        now: UnixTimestamp,
    ) -> Result<Self, RaffleError> {
        config.validate()?;
        Ok(Self {
            is_initialized: true,
            authority,
            nonce,
            bump,
            config,
            state: RaffleState::Open,
            players: Vec::with_capacity(config.max_players as usize),
            pool: 0,
            last_timestamp: now,
            recent_winner: None,
            pending_request: None,
            request_nonce: 0,
            rounds_completed: 0,
        })
    }

    /// Deserialize an initialized raffle from account data
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let raffle = try_from_slice_unchecked::<Raffle>(src)
            .map_err(|_| ProgramError::InvalidAccountData)?;
        if !raffle.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }

    /// True when `src` does not yet hold a raffle
    pub fn is_uninitialized(src: &[u8]) -> bool {
        src.first().map_or(true, |flag| *flag == 0)
    }

    pub fn save(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer = dst;
        self.serialize(&mut writer)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}
