use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{instruction::Instruction, native_token::LAMPORTS_PER_SOL};
use solana_program_test::*;
use solana_sdk::{
    instruction::InstructionError,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::{clock::Clock, rent::Rent},
    transaction::{Transaction, TransactionError},
};

use upkeep_raffle::{
    error::RaffleError,
    instruction,
    oracle::random_word_from_u64,
    process_instruction,
    raffle::UpkeepStatus,
    state::{Raffle, RaffleConfig, RaffleState},
    utils::find_raffle_address,
};

const FEE: u64 = 10_000_000; // 0.01 SOL
const INTERVAL: i64 = 30;

struct TestRaffle {
    context: ProgramTestContext,
    program_id: Pubkey,
    raffle: Pubkey,
    coordinator: Keypair,
}

async fn start() -> (ProgramTestContext, Pubkey) {
    let program_id = Pubkey::new_unique();
    let program_test = ProgramTest::new(
        "upkeep_raffle",
        program_id,
        processor!(process_instruction),
    );
    (program_test.start_with_context().await, program_id)
}

// Setup program test with one initialized raffle
async fn setup() -> TestRaffle {
    setup_with_fee(FEE).await
}

async fn setup_with_fee(fee: u64) -> TestRaffle {
    let (mut context, program_id) = start().await;
    let coordinator = Keypair::new();

    let config = raffle_config(&coordinator.pubkey(), fee);
    let authority = context.payer.pubkey();
    let ix = instruction::initialize_raffle(&program_id, &authority, 0, config);
    process(&mut context, &[ix], &[]).await.unwrap();

    let (raffle, _) = find_raffle_address(&program_id, &authority, 0);
    TestRaffle {
        context,
        program_id,
        raffle,
        coordinator,
    }
}

fn raffle_config(coordinator: &Pubkey, fee: u64) -> RaffleConfig {
    let mut config = RaffleConfig::default();
    config.entrance_fee = fee;
    config.interval = INTERVAL;
    config.max_players = 10;
    config.randomness.coordinator = *coordinator;
    config.randomness.key_hash = [9u8; 32];
    config.randomness.subscription_id = 1;
    config
}

// Sign with the payer plus `signers` against a fresh blockhash
async fn sign(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Transaction {
    let blockhash = context
        .banks_client
        .get_new_latest_blockhash(&context.last_blockhash)
        .await
        .unwrap();
    context.last_blockhash = blockhash;

    let mut transaction = Transaction::new_with_payer(instructions, Some(&context.payer.pubkey()));
    transaction.partial_sign(&[&context.payer], blockhash);
    for signer in signers {
        transaction.partial_sign(&[*signer], blockhash);
    }
    transaction
}

async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let transaction = sign(context, instructions, signers).await;
    context.banks_client.process_transaction(transaction).await
}

struct Simulation {
    logs: Vec<String>,
    return_data: Option<(Pubkey, Vec<u8>)>,
}

impl Simulation {
    fn count(&self, prefix: &str) -> usize {
        let needle = format!("Program log: {}", prefix);
        self.logs.iter().filter(|log| log.starts_with(&needle)).count()
    }
}

// Run a successful transaction without committing it
async fn simulate(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Simulation {
    let transaction = sign(context, instructions, signers).await;
    let result = context
        .banks_client
        .simulate_transaction(transaction)
        .await
        .unwrap();
    assert_eq!(result.result, Some(Ok(())));
    let details = result.simulation_details.unwrap();
    Simulation {
        logs: details.logs,
        return_data: details
            .return_data
            .map(|return_data| (return_data.program_id, return_data.data)),
    }
}

// The runtime trims trailing zero bytes from return data
fn decode_upkeep_status(mut data: Vec<u8>) -> UpkeepStatus {
    let len = UpkeepStatus::default().try_to_vec().unwrap().len();
    data.resize(len, 0);
    UpkeepStatus::try_from_slice(&data).unwrap()
}

fn assert_raffle_error(result: Result<(), BanksClientError>, expected: RaffleError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(expected.code()))
    );
}

impl TestRaffle {
    async fn state(&mut self) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(self.raffle)
            .await
            .unwrap()
            .unwrap();
        Raffle::load(&account.data).unwrap()
    }

    async fn balance(&mut self, address: Pubkey) -> u64 {
        self.context.banks_client.get_balance(address).await.unwrap()
    }

    async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let fund = system_instruction::transfer(
            &self.context.payer.pubkey(),
            &player.pubkey(),
            LAMPORTS_PER_SOL,
        );
        process(&mut self.context, &[fund], &[]).await.unwrap();
        player
    }

    async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter_raffle(&self.program_id, &player.pubkey(), &self.raffle, amount);
        process(&mut self.context, &[ix], &[player]).await
    }

    async fn perform_upkeep(&mut self) -> Result<(), BanksClientError> {
        let keeper = self.context.payer.pubkey();
        let ix = instruction::perform_upkeep(&self.program_id, &keeper, &self.raffle, vec![]);
        process(&mut self.context, &[ix], &[]).await
    }

    async fn fulfill(
        &mut self,
        request_id: u64,
        word: u64,
        winner: &Pubkey,
    ) -> Result<(), BanksClientError> {
        let ix = instruction::fulfill_random_words(
            &self.program_id,
            &self.coordinator.pubkey(),
            &self.raffle,
            winner,
            request_id,
            vec![random_word_from_u64(word)],
        );
        process(&mut self.context, &[ix], &[&self.coordinator]).await
    }

    async fn advance_clock(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    async fn pending_request(&mut self) -> u64 {
        self.state().await.pending_request().unwrap()
    }
}

#[tokio::test]
async fn test_initialize_raffle() {
    let mut test = setup().await;
    let clock: Clock = test.context.banks_client.get_sysvar().await.unwrap();
    let rent: Rent = test.context.banks_client.get_sysvar().await.unwrap();

    let raffle = test.state().await;
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.entrance_fee(), FEE);
    assert_eq!(raffle.interval(), INTERVAL);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.last_timestamp(), clock.unix_timestamp);
    assert_eq!(raffle.recent_winner(), None);
    assert_eq!(raffle.num_words(), 1);

    let raffle_address = test.raffle;
    assert_eq!(
        test.balance(raffle_address).await,
        rent.minimum_balance(Raffle::space(10))
    );
}

#[tokio::test]
async fn test_initialize_twice_fails() {
    let mut test = setup().await;
    let authority = test.context.payer.pubkey();
    let config = raffle_config(&test.coordinator.pubkey(), FEE);
    let ix = instruction::initialize_raffle(&test.program_id, &authority, 0, config);

    assert_raffle_error(
        process(&mut test.context, &[ix], &[]).await,
        RaffleError::AlreadyInitialized,
    );
}

#[tokio::test]
async fn test_initialize_with_prefunded_address() {
    let (mut context, program_id) = start().await;
    let coordinator = Keypair::new();
    let authority = context.payer.pubkey();
    let (raffle_address, _) = find_raffle_address(&program_id, &authority, 0);

    let grief = system_instruction::transfer(&authority, &raffle_address, 1_000_000);
    process(&mut context, &[grief], &[]).await.unwrap();

    let config = raffle_config(&coordinator.pubkey(), FEE);
    let ix = instruction::initialize_raffle(&program_id, &authority, 0, config);
    process(&mut context, &[ix], &[]).await.unwrap();

    let account = context
        .banks_client
        .get_account(raffle_address)
        .await
        .unwrap()
        .unwrap();
    let rent: Rent = context.banks_client.get_sysvar().await.unwrap();
    assert_eq!(account.owner, program_id);
    assert_eq!(account.data.len(), Raffle::space(10));
    assert_eq!(account.lamports, rent.minimum_balance(Raffle::space(10)));
    let raffle = Raffle::load(&account.data).unwrap();
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.entrance_fee(), FEE);
}

#[tokio::test]
async fn test_enter_raffle() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    let raffle_address = test.raffle;
    let raffle_lamports = test.balance(raffle_address).await;

    test.enter(&player, FEE).await.unwrap();

    let raffle = test.state().await;
    assert_eq!(raffle.player(0), Some(player.pubkey()));
    assert_eq!(raffle.number_of_players(), 1);
    assert_eq!(raffle.pool_balance(), FEE);
    assert_eq!(test.balance(raffle_address).await, raffle_lamports + FEE);
    assert_eq!(test.balance(player.pubkey()).await, LAMPORTS_PER_SOL - FEE);
}

#[tokio::test]
async fn test_enter_with_insufficient_fee_fails() {
    let mut test = setup().await;
    let player = test.funded_player().await;

    assert_raffle_error(
        test.enter(&player, FEE / 2).await,
        RaffleError::InsufficientFee {
            paid: FEE / 2,
            required: FEE,
        },
    );

    let raffle = test.state().await;
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.pool_balance(), 0);
    assert_eq!(test.balance(player.pubkey()).await, LAMPORTS_PER_SOL);
}

#[tokio::test]
async fn test_perform_upkeep_without_players_fails() {
    let mut test = setup().await;
    test.advance_clock(INTERVAL + 1).await;

    assert_raffle_error(
        test.perform_upkeep().await,
        RaffleError::UpkeepNotNeeded {
            balance: 0,
            players: 0,
            state: RaffleState::Open,
        },
    );
    assert_eq!(test.state().await.raffle_state(), RaffleState::Open);
}

#[tokio::test]
async fn test_perform_upkeep_before_interval_fails() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    test.enter(&player, FEE).await.unwrap();
    test.advance_clock(INTERVAL - 1).await;

    assert_raffle_error(
        test.perform_upkeep().await,
        RaffleError::UpkeepNotNeeded {
            balance: FEE,
            players: 1,
            state: RaffleState::Open,
        },
    );
}

#[tokio::test]
async fn test_check_upkeep_is_read_only() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    test.enter(&player, FEE).await.unwrap();
    let ix = instruction::check_upkeep(&test.program_id, &test.raffle, vec![]);

    let simulation = simulate(&mut test.context, &[ix.clone()], &[]).await;
    let (program_id, data) = simulation.return_data.unwrap();
    assert_eq!(program_id, test.program_id);
    assert_eq!(
        decode_upkeep_status(data),
        UpkeepStatus {
            upkeep_needed: false,
            is_open: true,
            time_passed: false,
            has_players: true,
            has_balance: true,
        }
    );

    test.advance_clock(INTERVAL + 1).await;
    let before = test.state().await;
    let simulation = simulate(&mut test.context, &[ix.clone()], &[]).await;
    let (_, data) = simulation.return_data.unwrap();
    assert!(decode_upkeep_status(data).upkeep_needed);

    process(&mut test.context, &[ix], &[]).await.unwrap();
    assert_eq!(test.state().await, before);
}

#[tokio::test]
async fn test_events_logged_once_per_operation() {
    let mut test = setup().await;
    let player = test.funded_player().await;

    let enter = instruction::enter_raffle(&test.program_id, &player.pubkey(), &test.raffle, FEE);
    let simulation = simulate(&mut test.context, &[enter.clone()], &[&player]).await;
    assert_eq!(simulation.count("EnteredRaffle:"), 1);
    assert_eq!(simulation.count("RequestedRaffleWinner:"), 0);
    assert_eq!(simulation.count("WinnerPicked:"), 0);
    process(&mut test.context, &[enter], &[&player]).await.unwrap();

    test.advance_clock(INTERVAL + 1).await;
    let keeper = test.context.payer.pubkey();
    let perform = instruction::perform_upkeep(&test.program_id, &keeper, &test.raffle, vec![]);
    let simulation = simulate(&mut test.context, &[perform.clone()], &[]).await;
    assert_eq!(simulation.count("EnteredRaffle:"), 0);
    assert_eq!(simulation.count("RequestedRaffleWinner:"), 1);
    assert_eq!(simulation.count("WinnerPicked:"), 0);
    process(&mut test.context, &[perform], &[]).await.unwrap();

    let request_id = test.pending_request().await;
    let fulfill = instruction::fulfill_random_words(
        &test.program_id,
        &test.coordinator.pubkey(),
        &test.raffle,
        &player.pubkey(),
        request_id,
        vec![random_word_from_u64(7)],
    );
    let simulation = simulate(&mut test.context, &[fulfill], &[&test.coordinator]).await;
    assert_eq!(simulation.count("EnteredRaffle:"), 0);
    assert_eq!(simulation.count("RequestedRaffleWinner:"), 0);
    assert_eq!(simulation.count("WinnerPicked:"), 1);
}

#[tokio::test]
async fn test_full_round_pays_winner() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    let raffle_address = test.raffle;
    let reserve = test.balance(raffle_address).await;
    test.enter(&player, FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;

    test.perform_upkeep().await.unwrap();
    let raffle = test.state().await;
    assert_eq!(raffle.raffle_state(), RaffleState::Calculating);
    let request_id = test.pending_request().await;

    // Entry is closed and no second request can be issued
    let late_player = test.funded_player().await;
    assert_raffle_error(test.enter(&late_player, FEE).await, RaffleError::RaffleClosed);
    assert_raffle_error(
        test.perform_upkeep().await,
        RaffleError::UpkeepNotNeeded {
            balance: FEE,
            players: 1,
            state: RaffleState::Calculating,
        },
    );

    let winner_before = test.balance(player.pubkey()).await;
    test.fulfill(request_id, 7, &player.pubkey()).await.unwrap();

    let raffle = test.state().await;
    let clock: Clock = test.context.banks_client.get_sysvar().await.unwrap();
    assert_eq!(raffle.recent_winner(), Some(player.pubkey()));
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.player(0), None);
    assert_eq!(raffle.pool_balance(), 0);
    assert_eq!(raffle.pending_request(), None);
    assert_eq!(raffle.last_timestamp(), clock.unix_timestamp);
    assert_eq!(test.balance(player.pubkey()).await, winner_before + FEE);
    assert_eq!(test.balance(raffle_address).await, reserve);

    // The raffle reopens for the next round
    test.enter(&late_player, FEE).await.unwrap();
    assert_eq!(test.state().await.number_of_players(), 1);
}

#[tokio::test]
async fn test_winner_selected_by_random_word_modulo_players() {
    let mut test = setup().await;
    let mut players = Vec::new();
    for _ in 0..4 {
        let player = test.funded_player().await;
        test.enter(&player, FEE).await.unwrap();
        players.push(player);
    }
    test.advance_clock(INTERVAL + 1).await;
    test.perform_upkeep().await.unwrap();
    let request_id = test.pending_request().await;

    let raffle = test.state().await;
    let winner = players[3].pubkey();
    assert_eq!(raffle.winner_for(&random_word_from_u64(11)), Some(winner));

    let winner_before = test.balance(winner).await;
    test.fulfill(request_id, 11, &winner).await.unwrap();

    assert_eq!(test.state().await.recent_winner(), Some(winner));
    assert_eq!(test.balance(winner).await, winner_before + FEE * 4);
}

#[tokio::test]
async fn test_fulfill_unknown_request_fails() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    test.enter(&player, FEE).await.unwrap();

    // No request has been issued yet
    assert_raffle_error(
        test.fulfill(1, 7, &player.pubkey()).await,
        RaffleError::UnknownRequest { request_id: 1 },
    );

    test.advance_clock(INTERVAL + 1).await;
    test.perform_upkeep().await.unwrap();
    let request_id = test.pending_request().await;
    let before = test.state().await;

    let bogus = request_id.wrapping_add(1);
    assert_raffle_error(
        test.fulfill(bogus, 7, &player.pubkey()).await,
        RaffleError::UnknownRequest { request_id: bogus },
    );
    assert_eq!(test.state().await, before);
}

#[tokio::test]
async fn test_fulfill_requires_coordinator() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    test.enter(&player, FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;
    test.perform_upkeep().await.unwrap();
    let request_id = test.pending_request().await;

    let impostor = Keypair::new();
    let ix = instruction::fulfill_random_words(
        &test.program_id,
        &impostor.pubkey(),
        &test.raffle,
        &player.pubkey(),
        request_id,
        vec![random_word_from_u64(7)],
    );
    assert_raffle_error(
        process(&mut test.context, &[ix], &[&impostor]).await,
        RaffleError::OnlyCoordinatorCanFulfill,
    );
    assert_eq!(test.state().await.raffle_state(), RaffleState::Calculating);
}

#[tokio::test]
async fn test_failed_payout_keeps_round_open_for_retry() {
    let mut test = setup().await;
    let player = test.funded_player().await;
    let bystander = test.funded_player().await;
    test.enter(&player, FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;
    test.perform_upkeep().await.unwrap();
    let request_id = test.pending_request().await;
    let before = test.state().await;

    assert_raffle_error(
        test.fulfill(request_id, 7, &bystander.pubkey()).await,
        RaffleError::PayoutFailed {
            winner: player.pubkey(),
            amount: FEE,
        },
    );
    assert_eq!(test.state().await, before);
    assert_eq!(test.balance(bystander.pubkey()).await, LAMPORTS_PER_SOL);

    test.fulfill(request_id, 7, &player.pubkey()).await.unwrap();
    assert_eq!(test.state().await.recent_winner(), Some(player.pubkey()));
}

#[tokio::test]
async fn test_payout_below_rent_for_drained_winner_fails() {
    let fee = 100;
    let mut test = setup_with_fee(fee).await;
    let player = test.funded_player().await;
    test.enter(&player, fee).await.unwrap();

    // Winner empties their wallet while the round is open
    let remaining = test.balance(player.pubkey()).await;
    let payer = test.context.payer.pubkey();
    let drain = system_instruction::transfer(&player.pubkey(), &payer, remaining);
    process(&mut test.context, &[drain], &[&player]).await.unwrap();

    test.advance_clock(INTERVAL + 1).await;
    test.perform_upkeep().await.unwrap();
    let request_id = test.pending_request().await;
    let before = test.state().await;

    assert_raffle_error(
        test.fulfill(request_id, 0, &player.pubkey()).await,
        RaffleError::PayoutFailed {
            winner: player.pubkey(),
            amount: fee,
        },
    );
    assert_eq!(test.state().await, before);

    // Once the wallet is funded again the same request settles
    let refund = system_instruction::transfer(&payer, &player.pubkey(), LAMPORTS_PER_SOL);
    process(&mut test.context, &[refund], &[]).await.unwrap();
    test.fulfill(request_id, 0, &player.pubkey()).await.unwrap();
    assert_eq!(test.balance(player.pubkey()).await, LAMPORTS_PER_SOL + fee);
}
