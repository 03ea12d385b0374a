//! Terminal game loop. The wager and the grid are settled by the session before any
//! reel is shown; the staggered reveal only replays an already-known result.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;

use reelspin_core::{
    EntropySource, GameSession, Grid, PendingSpin, ProvablyFairRng, SessionError, SpinOutcome,
};

pub enum Dealer {
    Fair(ProvablyFairRng),
    Entropy(EntropySource),
}

impl Dealer {
    /// Starts a spin; a provably fair dealer only burns a nonce when the wager is accepted.
    fn begin(
        &mut self,
        session: &mut GameSession,
        bet: f64,
        lines: usize,
    ) -> Result<(PendingSpin, Option<u64>), SessionError> {
        match self {
            Dealer::Fair(rng) => {
                let (nonce, mut stream) = rng.peek_spin();
                let pending = session.begin_spin(&mut stream, bet, lines)?;
                rng.nonce = nonce;
                Ok((pending, Some(nonce)))
            }
            Dealer::Entropy(source) => Ok((session.begin_spin(source, bet, lines)?, None)),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Deposit(f64),
    Spin { bet: f64, lines: Option<usize> },
    Balance,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Err("empty command".into());
    };
    let number = |s: Option<&str>, what: &str| -> Result<f64, String> {
        s.ok_or_else(|| format!("missing {what}"))?
            .parse::<f64>()
            .map_err(|_| format!("invalid {what}"))
    };
    match word.to_ascii_lowercase().as_str() {
        "deposit" | "d" => Ok(Command::Deposit(number(parts.next(), "deposit amount")?)),
        "spin" | "s" => {
            let bet = number(parts.next(), "bet amount")?;
            let lines = match parts.next() {
                Some(l) => Some(l.parse::<usize>().map_err(|_| "invalid lines".to_string())?),
                None => None,
            };
            Ok(Command::Spin { bet, lines })
        }
        "balance" | "b" => Ok(Command::Balance),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command `{other}`")),
    }
}

pub fn render_rows(grid: &Grid) -> String {
    grid.rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_column(grid: &Grid, col: usize) -> String {
    grid.columns()[col]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(outcome: &SpinOutcome) -> String {
    if outcome.is_win() {
        let lines: Vec<String> = outcome
            .line_wins
            .iter()
            .map(|w| {
                let s = w.symbol;
                format!("line {} {s}{s}{s} pays ${}", w.line + 1, w.payout)
            })
            .collect();
        format!("YOU WON ${}! ({})", outcome.winnings, lines.join(", "))
    } else {
        "No luck this time.".to_string()
    }
}

const HELP: &str = "commands: deposit <amount> | spin <bet> [lines] | balance | help | quit";

fn prompt(text: &str) -> anyhow::Result<()> {
    print!("{text}");
    std::io::stdout().flush().context("flushing stdout")
}

pub async fn run(
    mut session: GameSession,
    mut dealer: Dealer,
    reel_delay: Duration,
) -> anyhow::Result<()> {
    if let Dealer::Fair(rng) = &dealer {
        println!(
            "server seed hash {} client seed {}",
            rng.server_seed_hash_hex(),
            rng.client_seed
        );
    }
    println!("Welcome! Deposit to start.");
    println!("{HELP}");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&format!("[${}] > ", session.balance()))?;
        let Some(line) = input.next_line().await.context("reading stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        match command {
            Command::Deposit(amount) => match session.deposit(amount) {
                Ok(balance) => println!("Balance ${balance}. Place your bet!"),
                Err(e) => println!("{e}"),
            },
            Command::Balance => println!("Balance ${}", session.balance()),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Spin { bet, lines } => {
                let lines = lines.unwrap_or(session.lines());
                let (pending, nonce) = match dealer.begin(&mut session, bet, lines) {
                    Ok(started) => started,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                println!("Spinning... balance ${}", session.balance());
                for col in 0..pending.grid().columns().len() {
                    sleep(reel_delay).await;
                    println!("reel {}: {}", col + 1, render_column(pending.grid(), col));
                }
                let outcome = session.resolve(pending)?;
                println!("{}", render_rows(&outcome.grid));
                if let Some(nonce) = nonce {
                    println!("nonce {nonce}");
                }
                println!("{}", describe(&outcome));
                if outcome.terminal {
                    println!("Game Over! Deposit to play again.");
                }
            }
        }
    }
    println!("Cashing out ${}", session.balance());
    Ok(())
}
