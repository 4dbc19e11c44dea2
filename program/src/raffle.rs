// Upkeep Raffle Program - Round state machine
//
// Pure transitions over `Raffle`: no account access and no syscalls. The
// processor loads the account, calls one of these, and saves the result only
// when it succeeds.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    event::RaffleEvent,
    oracle::{winner_index, RandomWord, RandomnessOracle, RandomnessRequest},
    payout::PrizeVault,
    state::{Raffle, RaffleState},
};

/// Result of the upkeep eligibility check, with each condition broken out
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    /// Payload to hand back to `perform_upkeep`; unused by the raffle
    pub fn perform_data(&self) -> Vec<u8> {
        Vec::new()
    }
}

impl Raffle {
    /// Buy one ticket for `participant`. Overpayment is pooled, not refunded.
    pub fn enter(&mut self, participant: Pubkey, paid: u64) -> Result<RaffleEvent, RaffleError> {
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleClosed);
        }
        if paid < self.config.entrance_fee {
            return Err(RaffleError::InsufficientFee {
                paid,
                required: self.config.entrance_fee,
            });
        }
        if self.players.len() >= self.config.max_players as usize {
            return Err(RaffleError::RaffleFull {
                capacity: self.config.max_players,
            });
        }
        let pool = self.pool.checked_add(paid).ok_or(RaffleError::Overflow)?;

        self.players.push(participant);
        self.pool = pool;
        Ok(RaffleEvent::EnteredRaffle { participant, paid })
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepStatus {
        let is_open = self.state == RaffleState::Open;
        let time_passed = now.saturating_sub(self.last_timestamp) >= self.config.interval;
        let has_players = !self.players.is_empty();
        let has_balance = self.pool > 0;
        UpkeepStatus {
            upkeep_needed: is_open && time_passed && has_players && has_balance,
            is_open,
            time_passed,
            has_players,
            has_balance,
        }
    }

    /// Close entry and request randomness. Eligibility is re-checked here;
    /// callers are never trusted to have called `check_upkeep` first.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        if !self.check_upkeep(now).upkeep_needed {
            return Err(RaffleError::UpkeepNotNeeded {
                balance: self.pool,
                players: self.players.len() as u64,
                state: self.state,
            });
        }
        let request_nonce = self
            .request_nonce
            .checked_add(1)
            .ok_or(RaffleError::Overflow)?;
        let request = RandomnessRequest::new(&self.config.randomness, self.request_nonce);
        let request_id = oracle.request_random_words(&request)?;

        self.state = RaffleState::Calculating;
        self.pending_request = Some(request_id);
        self.request_nonce = request_nonce;
        Ok(RaffleEvent::RequestedRaffleWinner { request_id })
    }

    /// Settle the outstanding request: pick the winner, pay the full pool and
    /// reopen. Nothing is committed unless the payout succeeds.
    pub fn fulfill_random_words<V: PrizeVault>(
        &mut self,
        request_id: u64,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        vault: &mut V,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.pending_request != Some(request_id) {
            return Err(RaffleError::UnknownRequest { request_id });
        }
        let word = random_words.first().ok_or(RaffleError::MissingRandomWords)?;
        let winner = self.winner_for(word).ok_or(RaffleError::NoPlayers)?;
        let prize = self.pool;

        if let Err(e) = vault.release(&winner, prize) {
            msg!("Payout failed: {}", e);
            return Err(RaffleError::PayoutFailed {
                winner,
                amount: prize,
            });
        }

        self.recent_winner = Some(winner);
        self.players.clear();
        self.pool = 0;
        self.last_timestamp = now;
        self.state = RaffleState::Open;
        self.pending_request = None;
        self.rounds_completed = self.rounds_completed.saturating_add(1);
        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            request_id,
        })
    }

    /// Player a random word would select from the current round
    pub fn winner_for(&self, word: &RandomWord) -> Option<Pubkey> {
        winner_index(word, self.players.len()).map(|index| self.players[index])
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.state
    }

    pub fn player(&self, index: usize) -> Option<Pubkey> {
        self.players.get(index).copied()
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn interval(&self) -> i64 {
        self.config.interval
    }

    pub fn pool_balance(&self) -> u64 {
        self.pool
    }

    pub fn pending_request(&self) -> Option<u64> {
        self.pending_request
    }

    pub fn request_confirmations(&self) -> u16 {
        self.config.randomness.request_confirmations
    }

    pub fn num_words(&self) -> u32 {
        self.config.randomness.num_words
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }
}
