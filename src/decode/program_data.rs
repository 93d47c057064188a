//! Decoder for Deriverse `Program data: <base64>` log lines.
//!
//! Each payload starts with a log-type tag followed by a fixed little-endian
//! layout. Payloads that are too short, carry an unknown tag, or fail base64
//! decoding are skipped; programs emit unrelated data lines too.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::trace;

use crate::domain::decimal::{BASE_SCALE, QUOTE_SCALE};
use crate::domain::{
    Decimal, FeeEvent, FillEvent, MarketKind, PlaceOrderEvent, ProgramEvents, Side,
};

/// Prefix of log lines carrying program-emitted data.
pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

pub const PERP_PLACE_ORDER_LEN: usize = 48;
pub const SPOT_PLACE_ORDER_LEN: usize = 40;
pub const FILL_ORDER_LEN: usize = 48;
pub const FEES_LEN: usize = 24;

/// Log-type tags emitted by the Deriverse program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogTag {
    SpotPlaceOrder = 10,
    SpotFillOrder = 11,
    SpotFees = 15,
    PerpPlaceOrder = 18,
    PerpFillOrder = 19,
    PerpFees = 23,
}

impl LogTag {
    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            10 => Some(LogTag::SpotPlaceOrder),
            11 => Some(LogTag::SpotFillOrder),
            15 => Some(LogTag::SpotFees),
            18 => Some(LogTag::PerpPlaceOrder),
            19 => Some(LogTag::PerpFillOrder),
            23 => Some(LogTag::PerpFees),
            _ => None,
        }
    }

    /// Minimum payload length for this record, tag byte included.
    pub fn record_len(&self) -> usize {
        match self {
            LogTag::PerpPlaceOrder => PERP_PLACE_ORDER_LEN,
            LogTag::SpotPlaceOrder => SPOT_PLACE_ORDER_LEN,
            LogTag::SpotFillOrder | LogTag::PerpFillOrder => FILL_ORDER_LEN,
            LogTag::SpotFees | LogTag::PerpFees => FEES_LEN,
        }
    }

    pub fn market_kind(&self) -> MarketKind {
        match self {
            LogTag::PerpPlaceOrder | LogTag::PerpFillOrder | LogTag::PerpFees => MarketKind::Perp,
            LogTag::SpotPlaceOrder | LogTag::SpotFillOrder | LogTag::SpotFees => MarketKind::Spot,
        }
    }
}

/// A single decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramEvent {
    PlaceOrder(PlaceOrderEvent),
    Fill(FillEvent),
    Fee(FeeEvent),
}

/// Decode all recognized records from a transaction's log lines, in log order.
pub fn parse_program_data_logs<S: AsRef<str>>(logs: &[S]) -> ProgramEvents {
    let mut events = ProgramEvents::default();

    for line in logs {
        let Some(payload) = line.as_ref().strip_prefix(PROGRAM_DATA_PREFIX) else {
            continue;
        };
        let bytes = match STANDARD.decode(payload.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                trace!(error = %e, "Skipping program data line with invalid base64");
                continue;
            }
        };

        match decode_record(&bytes) {
            Some(ProgramEvent::PlaceOrder(e)) => events.place_orders.push(e),
            Some(ProgramEvent::Fill(e)) => events.fills.push(e),
            Some(ProgramEvent::Fee(e)) => events.fees.push(e),
            None => {}
        }
    }

    events
}

/// Decode one raw record. Returns None for anything not recognized.
pub fn decode_record(buf: &[u8]) -> Option<ProgramEvent> {
    let tag = LogTag::from_byte(*buf.first()?)?;
    if buf.len() < tag.record_len() {
        trace!(
            tag = ?tag,
            len = buf.len(),
            required = tag.record_len(),
            "Skipping undersized program data record"
        );
        return None;
    }

    let kind = tag.market_kind();
    let event = match tag {
        LogTag::PerpPlaceOrder | LogTag::SpotPlaceOrder => {
            ProgramEvent::PlaceOrder(PlaceOrderEvent {
                kind,
                side: Side::from_flag(buf[2])?,
                client_id: read_u32(buf, 4),
                order_id: read_i64(buf, 8),
                size: Decimal::from_fixed(read_i64(buf, 16), BASE_SCALE),
                price: Decimal::from_fixed(read_i64(buf, 24), BASE_SCALE),
                instrument_id: read_u32(buf, 32),
            })
        }
        LogTag::PerpFillOrder | LogTag::SpotFillOrder => ProgramEvent::Fill(FillEvent {
            kind,
            side: Side::from_flag(buf[1])?,
            client_id: read_u32(buf, 4),
            order_id: read_i64(buf, 8),
            size: Decimal::from_fixed(read_i64(buf, 16), BASE_SCALE),
            quote_amount: Decimal::from_fixed(read_i64(buf, 24), QUOTE_SCALE),
            price: Decimal::from_fixed(read_i64(buf, 32), BASE_SCALE),
            rebate: Decimal::from_fixed(read_i64(buf, 40), QUOTE_SCALE),
        }),
        LogTag::PerpFees | LogTag::SpotFees => ProgramEvent::Fee(FeeEvent {
            kind,
            ref_client_id: read_u32(buf, 4),
            amount: Decimal::from_fixed(read_i64(buf, 8), QUOTE_SCALE),
            ref_payment: Decimal::from_fixed(read_i64(buf, 16), QUOTE_SCALE),
        }),
    };

    Some(event)
}

// Callers check `record_len` first, so these slices are always in bounds.
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}
