//! Livenet deploy and demo binary for Chorus.
//!
//! Run with:
//! - Deploy only:           CHORUS_LIVENET_MODE=deploy cargo run --bin chorus_livenet --features=livenet
//! - Demo on existing:      CHORUS_LIVENET_MODE=demo CHORUS_EXISTING_CHORUS=... CHORUS_EXISTING_COLLATERAL=... cargo run ...
//! - Redeem request:        CHORUS_LIVENET_MODE=redeem CHORUS_EXISTING_CHORUS=... CHORUS_EXISTING_COLLATERAL=... cargo run ...
//! - Query state:           CHORUS_LIVENET_MODE=query CHORUS_EXISTING_CHORUS=... CHORUS_EXISTING_COLLATERAL=... cargo run ...
//!
//! The collateral quote must be at least one hour old before Notes can be minted, so
//! `demo` is meant to run a while after `deploy` has submitted the mock price.
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN    (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_CHORUS   (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - CHORUS_EXISTING_ORACLE                  (64-hex or formatted "hash-..."/"contract-package-...")
//! - CHORUS_EXISTING_COLLATERAL              (same format)
//! - CHORUS_EXISTING_CHORUS                  (same format)
//! - CHORUS_BENEFICIARY                      (default: caller)
//! - CHORUS_PRICE_ID                         (default: 1)
//! - CHORUS_GRANULARITY                      (oracle units per price unit; default: 1000000)
//! - CHORUS_MOCK_PRICE                       (whole units, submitted to a freshly deployed mock; default: 100)
//! - CHORUS_NOMINAL_RATE_BPS                 (nominal annual inflation; default: 1000 = 10%)
//! - CHORUS_WHITELISTED                      ("1" for a whitelisted system; default: 0)
//! - CHORUS_DEMO_COLLATERAL                  (whole tokens; default: 10)
//! - CHORUS_DEMO_NOTES                       (whole Notes; default: 400)
//! - CHORUS_DEMO_REQUEST_WITHDRAW            (whole Notes, 0 to skip; default: 10)

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, HostRefLoader, NoArgs};
use odra::prelude::*;

use chorus_casper::chorus::{Chorus, ChorusHostRef, ChorusInitArgs};
use chorus_casper::math;
use chorus_casper::oracle::MockOracle;
use chorus_casper::tokens::{
    CollateralFaucetToken, CollateralFaucetTokenHostRef, CollateralFaucetTokenInitArgs,
};

const WAD: u128 = 1_000_000_000_000_000_000;
const MOTES_PER_CSPR: u64 = 1_000_000_000;
/// 1 bps in wad = 1e14
const BPS_TO_WAD: u128 = 100_000_000_000_000;

const DEFAULT_DEPLOY_GAS_TOKEN_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_CHORUS_MOTES: u64 = 700_000_000_000; // 700 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

fn main() {
    println!("============================================");
    println!("  Chorus Notes - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("CHORUS_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy";
    let should_demo = mode == "demo";
    let should_redeem = mode == "redeem";
    let should_query = mode == "query";

    let deploy_gas_token = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN", DEFAULT_DEPLOY_GAS_TOKEN_MOTES);
    let deploy_gas_chorus = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_CHORUS", DEFAULT_DEPLOY_GAS_CHORUS_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    let price_id = read_u64_env("CHORUS_PRICE_ID", 1) as u32;
    let granularity = read_u64_env("CHORUS_GRANULARITY", 1_000_000);
    let mock_price = read_u64_env("CHORUS_MOCK_PRICE", 100);
    let nominal_rate_bps = read_u64_env("CHORUS_NOMINAL_RATE_BPS", 1_000);
    let whitelisted = read_flag_env("CHORUS_WHITELISTED", false);
    let beneficiary = std::env::var("CHORUS_BENEFICIARY")
        .map(|raw| parse_contract_address(&raw))
        .unwrap_or_else(|_| env.caller());

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy_token={} ({} CSPR), deploy_chorus={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_token,
        deploy_gas_token / MOTES_PER_CSPR,
        deploy_gas_chorus,
        deploy_gas_chorus / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!();

    // ==========================================
    // Deploy mode
    // ==========================================
    if should_deploy {
        // Step 1: oracle
        let oracle_addr = match std::env::var("CHORUS_EXISTING_ORACLE") {
            Ok(raw) => {
                println!("[STEP 1] Reusing existing oracle...");
                parse_contract_address(&raw)
            }
            Err(_) => {
                println!("[STEP 1] Deploying mock oracle...");
                env.set_gas(deploy_gas_token);
                let mut oracle = MockOracle::deploy(&env, NoArgs);
                env.set_gas(call_gas);
                oracle.submit_value(price_id, U256::from(mock_price) * U256::from(granularity));
                println!("     Submitted price {} for feed {}", mock_price, price_id);
                oracle.address()
            }
        };
        println!("[OK] Oracle: {:?}", oracle_addr);
        println!();

        // Step 2: collateral token
        let collateral = match std::env::var("CHORUS_EXISTING_COLLATERAL") {
            Ok(raw) => {
                println!("[STEP 2] Reusing existing collateral token...");
                CollateralFaucetToken::load(&env, parse_contract_address(&raw))
            }
            Err(_) => {
                println!("[STEP 2] Deploying collateral faucet token...");
                env.set_gas(deploy_gas_token);
                CollateralFaucetToken::deploy(
                    &env,
                    CollateralFaucetTokenInitArgs {
                        name: "Chorus Test Collateral".to_string(),
                        symbol: "cCOL".to_string(),
                    },
                )
            }
        };
        println!("[OK] Collateral: {:?}", collateral.address());
        println!();

        // Step 3: Chorus
        println!("[STEP 3] Deploying Chorus contract...");
        let nominal = U256::from(nominal_rate_bps) * U256::from(BPS_TO_WAD);
        let effective = math::nominal_to_effective_annual_rate(nominal)
            .unwrap_or_else(|err| panic!("Cannot convert nominal rate {} bps: {:?}", nominal_rate_bps, err));
        env.set_gas(deploy_gas_chorus);
        let chorus = Chorus::deploy(
            &env,
            ChorusInitArgs {
                oracle: oracle_addr,
                collateral_token: collateral.address(),
                collateral_price_id: price_id,
                collateral_granularity: U256::from(granularity),
                name: "Chorus Note".to_string(),
                symbol: "NOTE".to_string(),
                inflation_rate_per_year: effective,
                beneficiary,
                whitelisted,
            },
        );
        println!("[OK] Chorus deployed at: {:?}", chorus.address());
        println!("     Effective annual rate: {} wad", effective);
        println!("     Rate per second: {} wad", chorus.inflation_rate_per_second());
        println!("     Collateral threshold: {}", chorus.collateral_threshold());
        println!();

        output_deploy_json(oracle_addr, collateral.address(), chorus.address());
        return;
    }

    let chorus_addr = read_address_env("CHORUS_EXISTING_CHORUS", &mode);
    let collateral_addr = read_address_env("CHORUS_EXISTING_COLLATERAL", &mode);
    let mut chorus = Chorus::load(&env, chorus_addr);
    let mut collateral = CollateralFaucetToken::load(&env, collateral_addr);
    let caller = env.caller();

    // ==========================================
    // Demo: deposit -> mint -> request_withdraw
    // ==========================================
    if should_demo {
        let collateral_amount = whole_units(read_u64_env("CHORUS_DEMO_COLLATERAL", 10));
        let notes_amount = whole_units(read_u64_env("CHORUS_DEMO_NOTES", 400));
        let withdraw_amount = whole_units(read_u64_env("CHORUS_DEMO_REQUEST_WITHDRAW", 10));

        println!("[DEMO 1] Minting {} collateral from faucet...", collateral_amount);
        env.set_gas(call_gas);
        collateral.faucet_mint(caller, collateral_amount);
        env.set_gas(call_gas);
        collateral.approve(chorus_addr, collateral_amount);
        println!("[OK] Approved Chorus.");

        println!("[DEMO 2] Depositing collateral...");
        env.set_gas(call_gas);
        chorus.deposit_collateral(collateral_amount);
        print_state(&env, &chorus, &collateral, caller);

        println!("[DEMO 3] Minting {} Notes to caller...", notes_amount);
        env.set_gas(call_gas);
        match chorus.try_mint_token(notes_amount, caller) {
            Ok(()) => println!("[OK] Notes minted."),
            Err(err) => println!("[SKIP] Mint failed (is the price quote an hour old?): {:?}", err),
        }
        print_state(&env, &chorus, &collateral, caller);

        if !withdraw_amount.is_zero() && chorus.balance_of(caller) >= withdraw_amount {
            println!("[DEMO 4] Requesting withdrawal of {} Notes...", withdraw_amount);
            env.set_gas(call_gas);
            chorus.request_withdraw_token(withdraw_amount);
            if let Some(request) = chorus.withdrawal_request(caller) {
                println!("[OK] Unlocks at {} (unix seconds).", request.unlock_at);
            }
            println!("[INFO] Run with CHORUS_LIVENET_MODE=redeem once unlocked.");
        }
    }

    if should_redeem {
        println!("[DEMO] Redeeming withdrawal request...");
        match chorus.withdrawal_request(caller) {
            None => println!("[WARN] No pending request. Skipping."),
            Some(request) => {
                env.set_gas(call_gas);
                chorus.withdraw_token();
                println!("[OK] Redeemed {} Notes.", request.amount);
                print_state(&env, &chorus, &collateral, caller);
            }
        }
    }

    // ==========================================
    // Query mode: Output state as JSON
    // ==========================================
    if should_query {
        let request = chorus.withdrawal_request(caller).unwrap_or_default();
        println!(
            "CHORUS_STATE_JSON={{\"total_supply\":\"{}\",\"token_price\":\"{}\",\"collateral_balance\":\"{}\",\"collateral_threshold\":\"{}\",\"liquidation_penalty\":\"{}\",\"escrowed_notes\":\"{}\",\"note_balance\":\"{}\",\"collateral_wallet\":\"{}\",\"request_amount\":\"{}\",\"request_unlock_at\":{},\"user\":\"{:?}\"}}",
            chorus.total_supply(),
            chorus.token_price(),
            chorus.collateral_balance(),
            chorus.collateral_threshold(),
            chorus.liquidation_penalty(),
            chorus.escrowed_notes(),
            chorus.balance_of(caller),
            collateral.balance_of(caller),
            request.amount,
            request.unlock_at,
            caller
        );
    }
}

fn print_state(
    env: &HostEnv,
    chorus: &ChorusHostRef,
    collateral: &CollateralFaucetTokenHostRef,
    user: Address,
) {
    println!("     total_supply: {}", chorus.total_supply());
    println!("     token_price: {}", chorus.token_price());
    println!("     collateral_balance: {}", chorus.collateral_balance());
    match chorus.try_collateral_ratio() {
        Ok(ratio) => println!("     collateral_ratio: {}", ratio),
        Err(err) => println!("     collateral_ratio: unavailable ({:?})", err),
    }
    println!("     escrowed_notes: {}", chorus.escrowed_notes());
    println!("     user Notes: {}", chorus.balance_of(user));
    println!("     user collateral: {}", collateral.balance_of(user));
    println!("     caller: {:?}", env.caller());
    println!();
}

fn whole_units(units: u64) -> U256 {
    U256::from(units) * U256::from(WAD)
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn read_flag_env(name: &str, default_value: bool) -> bool {
    std::env::var(name)
        .map(|v| v.trim() != "0" && !v.trim().is_empty())
        .unwrap_or(default_value)
}

fn read_address_env(name: &str, mode: &str) -> Address {
    let raw = std::env::var(name)
        .unwrap_or_else(|_| panic!("{} must be set for mode={}", name, mode));
    parse_contract_address(&raw)
}

fn output_deploy_json(oracle_addr: Address, collateral_addr: Address, chorus_addr: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"CHORUS_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","oracle_contract_hash":"{}","collateral_contract_hash":"{}","chorus_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&oracle_addr),
        format_address_hash(&collateral_addr),
        format_address_hash(&chorus_addr),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    match (debug_str.find('['), debug_str.rfind(']')) {
        (Some(start), Some(end)) if start < end => debug_str[start + 1..end]
            .split(", ")
            .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
            .collect(),
        _ => debug_str,
    }
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    for prefix in ["contract-package-", "package-", "hash-"] {
        if let Some(hex) = trimmed.strip_prefix(prefix) {
            return Address::Contract(ContractPackageHash::new(decode_hex_32(hex)));
        }
    }
    if trimmed.len() == 64 {
        return Address::Contract(ContractPackageHash::new(decode_hex_32(trimmed)));
    }

    panic!("Invalid address format: {}", trimmed);
}
