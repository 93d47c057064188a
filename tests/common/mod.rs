//! Builders for Deriverse log payloads and venue transactions.
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use deriverse_ledger::config::DEFAULT_PROGRAM_IDS;
use deriverse_ledger::domain::{Decimal, RawTransaction};
use solana_pubkey::Pubkey;

pub const PERP_PLACE: u8 = 18;
pub const PERP_FILL: u8 = 19;
pub const PERP_FEES: u8 = 23;
pub const SPOT_PLACE: u8 = 10;
pub const SPOT_FILL: u8 = 11;
pub const SPOT_FEES: u8 = 15;

pub const BUY: u8 = 0;
pub const SELL: u8 = 1;

/// Whole units to a 1e9 fixed-point raw value.
pub fn e9(units: f64) -> i64 {
    (units * 1e9).round() as i64
}

/// Whole units to a 1e6 fixed-point raw value.
pub fn e6(units: f64) -> i64 {
    (units * 1e6).round() as i64
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn put_u32(buf: &mut [u8], offset: usize, v: u32) {
    buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_i64(buf: &mut [u8], offset: usize, v: i64) {
    buf[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
}

fn data_line(buf: &[u8]) -> String {
    format!("Program data: {}", STANDARD.encode(buf))
}

pub fn place_log(
    tag: u8,
    side: u8,
    order_id: i64,
    size: i64,
    price: i64,
    instrument: u32,
) -> String {
    let len = if tag == SPOT_PLACE { 40 } else { 48 };
    let mut buf = vec![0u8; len];
    buf[0] = tag;
    buf[2] = side;
    put_u32(&mut buf, 4, 1);
    put_i64(&mut buf, 8, order_id);
    put_i64(&mut buf, 16, size);
    put_i64(&mut buf, 24, price);
    put_u32(&mut buf, 32, instrument);
    data_line(&buf)
}

pub fn fill_log(tag: u8, side: u8, order_id: i64, size: i64, price: i64, rebate: i64) -> String {
    let mut buf = vec![0u8; 48];
    buf[0] = tag;
    buf[1] = side;
    put_u32(&mut buf, 4, 1);
    put_i64(&mut buf, 8, order_id);
    put_i64(&mut buf, 16, size);
    put_i64(&mut buf, 24, 0);
    put_i64(&mut buf, 32, price);
    put_i64(&mut buf, 40, rebate);
    data_line(&buf)
}

pub fn fee_log(tag: u8, amount: i64) -> String {
    let mut buf = vec![0u8; 24];
    buf[0] = tag;
    put_i64(&mut buf, 8, amount);
    data_line(&buf)
}

pub fn wallet_key(n: u8) -> String {
    Pubkey::new_from_array([n; 32]).to_string()
}

/// A transaction invoking the default Deriverse program.
pub fn venue_tx(signature: &str, block_time: i64, logs: Vec<String>) -> RawTransaction {
    RawTransaction::new(signature)
        .with_block_time(block_time)
        .with_account_keys(vec![wallet_key(1), DEFAULT_PROGRAM_IDS[0].to_string()])
        .with_instruction(1)
        .with_logs(logs)
}

/// A perp buy of `size` at `price` on instrument 0, with an explicit fee.
pub fn perp_trade_tx(
    signature: &str,
    block_time: i64,
    order_id: i64,
    side: u8,
    size: f64,
    price: f64,
    fee: f64,
) -> RawTransaction {
    venue_tx(
        signature,
        block_time,
        vec![
            place_log(PERP_PLACE, side, order_id, e9(size), e9(price), 0),
            fill_log(PERP_FILL, side, order_id, e9(size), e9(price), 0),
            fee_log(PERP_FEES, e6(fee)),
        ],
    )
}
