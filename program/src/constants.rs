// Upkeep Raffle Program - Constants
use solana_program::native_token::LAMPORTS_PER_SOL;

/// PDA seed prefix for raffle accounts
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Domain separator mixed into coordinator request ids
pub const REQUEST_ID_DOMAIN: &[u8] = b"randomness-request";

/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Upper bound on confirmation depth accepted at construction
pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;

/// Ticket capacity limit. Keeps `Raffle::space` under the 10 KiB that
/// `create_account` may allocate through a CPI.
pub const MAX_PLAYERS: u32 = 300;

/// Localnet defaults (0.01 SOL entry, 30 second rounds)
pub const DEFAULT_ENTRANCE_FEE: u64 = LAMPORTS_PER_SOL / 100;
pub const DEFAULT_INTERVAL: i64 = 30;
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
pub const DEFAULT_MAX_PLAYERS: u32 = 100;
