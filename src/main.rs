mod account;
mod clock;
mod error;
mod policy;

use std::sync::Arc;

use clap::Parser;

use account::{Account, AccountInfo};
use clock::SystemClock;
use error::AuthError;
use policy::PolicyStore;

#[derive(Parser)]
#[command(name = "rust_sentinel", about = "Shared policy + account lockout demo")]
struct Cli {
    /// Optional TOML file with policy overrides
    #[arg(long, default_value = "policy.toml")]
    policy_file: String,
}

fn section(title: &str, description: &str) {
    println!("\n{}", title);
    println!("{}", description);
    println!("{}", "-".repeat(40));
}

fn info_row(info: &AccountInfo) {
    match serde_json::to_string(info) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("❌ Could not serialize account {}: {}", info.id, e),
    }
}

fn login_line(name: &str, attempt: usize, result: Result<bool, AuthError>) {
    match result {
        Ok(true) => println!("✅ User: {} | Session started", name),
        Ok(false) => println!("⚠️  User: {} | Attempt {} failed - wrong password", name, attempt),
        Err(e) => println!("❌ User: {} | {}", name, e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // One shared policy store for the whole process; every consumer gets a
    // clone of this handle.
    let policy = PolicyStore::load_or_default(&cli.policy_file);
    let clock = Arc::new(SystemClock);

    println!("========================================");
    println!("SHARED POLICY / ACCOUNT LOCKOUT DEMO");
    println!("========================================");

    section(
        "ACCOUNT CREATION",
        "Accounts are validated against the live password policy",
    );
    let mut accounts = Vec::new();
    for (name, email, secret) in [
        ("Ana García", "ana@example.com", "Password123"),
        ("Carlos Ruiz", "carlos@example.com", "Segura456"),
        ("Laura Pérez", "laura@example.com", "MiClave789"),
        ("Pedro López", "pedro@example.com", "123"),
    ] {
        match Account::create(&policy, clock.clone(), name, email, secret) {
            Ok(account) => {
                println!("✅ Account '{}' created (id {})", name, account.id());
                accounts.push(account);
            }
            Err(e) => println!("❌ Could not create '{}': {}", name, e),
        }
    }

    section(
        "LOGIN SIMULATION",
        "Successful login, three-strike lockout, and maintenance mode",
    );
    if let Some(ana) = accounts.get_mut(0) {
        login_line("Ana García", 1, ana.login("Password123"));
    }
    if let Some(carlos) = accounts.get_mut(1) {
        for attempt in 1..=3 {
            let result = carlos.login("wrong_password");
            let stop = result.is_err();
            login_line("Carlos Ruiz", attempt, result);
            if stop {
                break;
            }
        }
    }
    policy.enter_maintenance();
    if let Some(laura) = accounts.get_mut(2) {
        login_line("Laura Pérez", 1, laura.login("MiClave789"));
    }
    policy.exit_maintenance();
    if let Some(laura) = accounts.get_mut(2) {
        login_line("Laura Pérez", 2, laura.login("MiClave789"));
    }

    section(
        "SHARED POLICY HANDLES",
        "A change through one handle is visible through every other",
    );
    let handle1 = policy.clone();
    let handle2 = policy.clone();
    handle1.set(policy::MAX_LOGIN_ATTEMPTS, 5i64);
    println!("Set via handle1: '{}' = 5", policy::MAX_LOGIN_ATTEMPTS);
    match handle2.get(policy::MAX_LOGIN_ATTEMPTS) {
        Some(v) => println!("Read via handle2: '{}' = {}", policy::MAX_LOGIN_ATTEMPTS, v),
        None => println!("Read via handle2: absent"),
    }

    section("ADMIN UNLOCK", "A locked account needs an explicit unlock");
    if let Some(carlos) = accounts.get_mut(1) {
        carlos.unlock();
        println!("🔓 Carlos Ruiz unlocked");
        login_line("Carlos Ruiz", 1, carlos.login("Segura456"));
    }

    section("ACCOUNT INFO", "Per-account display rows from export_info");
    for account in &accounts {
        info_row(&account.export_info());
    }

    section("POLICY SNAPSHOT", "Detached copy of the live policy state");
    for (key, value) in policy.snapshot() {
        println!("  {} = {}", key, value);
    }
}
