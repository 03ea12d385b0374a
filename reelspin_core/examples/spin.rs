use reelspin_core::{EngineParams, GameSession, ProvablyFairRng};

fn main() {
    // Example end-to-end session: deposit, one provably fair spin
    let mut rng = ProvablyFairRng::new("example-server-seed", "example-client-seed", 0);
    let mut session = GameSession::new(EngineParams::default_3x3()).expect("default machine is valid");
    session.deposit(100.0).expect("positive deposit");
    let (nonce, mut stream) = rng.next_spin();
    let outcome = session.spin(&mut stream, 1.0, 3).expect("wager fits the balance");
    println!(
        "server_seed_hash={} nonce={} winnings={} balance={} rows={:?}",
        rng.server_seed_hash_hex(),
        nonce,
        outcome.winnings,
        outcome.balance,
        outcome.grid.rows()
    );
}
