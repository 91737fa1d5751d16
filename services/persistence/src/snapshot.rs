//! Book snapshot — binary format and atomic file I/O
//!
//! # Binary format
//! ```text
//! [magic: 4 bytes = b"LOBS"]
//! [version: u16]
//! [next_trade_id: u64]
//! [next_timestamp_ns: u64]
//! [bid level count: u32]
//!   per level: [price: 16 bytes][order count: u32][orders…]
//! [ask level count: u32]  (same shape)
//! [checksum: u32]          // CRC32C over everything after the magic
//! ```
//!
//! Levels appear best-first (bids descending, asks ascending); orders
//! within a level appear in FIFO order, so restoring by appending in file
//! order reproduces time priority exactly.
//!
//! Per-order form: `[order_id: u64][client_order_id: u16 len + bytes]`
//! `[side: u8][type: u8][tif: u8][price: 16 bytes][original_qty: 16 bytes]`
//! `[remaining_qty: 16 bytes][ingest_timestamp_ns: u64]`. Prices and
//! quantities use rust_decimal's fixed 16-byte layout. All integers are
//! little-endian.
//!
//! The file is written atomically: temp file, fsync, rename.

use crc32c::crc32c;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use types::ids::{ClientId, ClientOrderId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side, TimeInForce};

/// File magic. A file not starting with these bytes is not a snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"LOBS";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("bad magic: not a book snapshot file")]
    BadMagic,

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("truncated snapshot while reading {0}")]
    Truncated(&'static str),

    #[error("invalid field encoding: {0}")]
    InvalidField(&'static str),
}

impl SnapshotError {
    /// Whether this error means the file exists but cannot be trusted.
    /// Corruption is fatal at startup; a missing file is not.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, SnapshotError::Io(_))
    }
}

// ── Snapshot model ──────────────────────────────────────────────────

/// One price level as persisted: its price and its orders in FIFO order.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub price: Price,
    pub orders: Vec<Order>,
}

/// The full persisted book state.
///
/// `next_timestamp_ns` is the engine clock's high-water mark; after
/// restore the clock is floored strictly above it so ingest timestamps
/// stay monotonic across restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub next_trade_id: u64,
    pub next_timestamp_ns: u64,
    /// Bid levels, best-first (descending price).
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, best-first (ascending price).
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Highest order id present in the snapshot, for re-seeding the
    /// order-id sequence after restore.
    pub fn max_order_id(&self) -> u64 {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .flat_map(|level| level.orders.iter())
            .map(|order| order.id.value())
            .max()
            .unwrap_or(0)
    }
}

// ── Encoding ────────────────────────────────────────────────────────

/// Serialize a snapshot to its binary form, checksum included.
pub fn encode(snapshot: &BookSnapshot) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.extend_from_slice(&SNAPSHOT_MAGIC);
    buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());

    write_symbol(&mut buf, &snapshot.symbol);
    buf.extend_from_slice(&snapshot.next_trade_id.to_le_bytes());
    buf.extend_from_slice(&snapshot.next_timestamp_ns.to_le_bytes());

    write_side_levels(&mut buf, &snapshot.bids);
    write_side_levels(&mut buf, &snapshot.asks);

    let checksum = crc32c(&buf[SNAPSHOT_MAGIC.len()..]);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

fn write_symbol(buf: &mut Vec<u8>, symbol: &Symbol) {
    let bytes = symbol.as_str().as_bytes();
    buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn write_side_levels(buf: &mut Vec<u8>, levels: &[LevelSnapshot]) {
    buf.extend_from_slice(&(levels.len() as u32).to_le_bytes());
    for level in levels {
        buf.extend_from_slice(&level.price.as_decimal().serialize());
        buf.extend_from_slice(&(level.orders.len() as u32).to_le_bytes());
        for order in &level.orders {
            write_order(buf, order);
        }
    }
}

fn write_order(buf: &mut Vec<u8>, order: &Order) {
    buf.extend_from_slice(&order.id.value().to_le_bytes());

    let client_order_id = order.client_order_id.as_str().as_bytes();
    buf.extend_from_slice(&(client_order_id.len() as u16).to_le_bytes());
    buf.extend_from_slice(client_order_id);

    buf.push(side_tag(order.side));
    buf.push(order_type_tag(order.order_type));
    buf.push(tif_tag(order.time_in_force));

    // Resting orders always carry a price; MARKET never rests.
    let price = order
        .price
        .map(|p| p.as_decimal())
        .unwrap_or(Decimal::ZERO);
    buf.extend_from_slice(&price.serialize());
    buf.extend_from_slice(&order.original_quantity.as_decimal().serialize());
    buf.extend_from_slice(&order.remaining_quantity.as_decimal().serialize());
    buf.extend_from_slice(&order.ingest_timestamp_ns.to_le_bytes());
}

fn side_tag(side: Side) -> u8 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

fn order_type_tag(order_type: OrderType) -> u8 {
    match order_type {
        OrderType::Limit => 0,
        OrderType::Market => 1,
    }
}

fn tif_tag(tif: TimeInForce) -> u8 {
    match tif {
        TimeInForce::Gtc => 0,
        TimeInForce::Ioc => 1,
        TimeInForce::Fok => 2,
    }
}

// ── Decoding ────────────────────────────────────────────────────────

/// Deserialize a snapshot, verifying magic, version, and checksum.
pub fn decode(data: &[u8]) -> Result<BookSnapshot, SnapshotError> {
    if data.len() < SNAPSHOT_MAGIC.len() + 2 + 4 {
        return Err(SnapshotError::Truncated("header"));
    }
    if data[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic);
    }

    let body_end = data.len() - 4;
    let stored = u32::from_le_bytes(data[body_end..].try_into().expect("4 bytes"));
    let actual = crc32c(&data[SNAPSHOT_MAGIC.len()..body_end]);
    if stored != actual {
        return Err(SnapshotError::ChecksumMismatch {
            expected: stored,
            actual,
        });
    }

    let mut reader = ByteReader::new(&data[SNAPSHOT_MAGIC.len()..body_end]);

    let version = reader.read_u16("version")?;
    if version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }

    let symbol_raw = reader.read_string("symbol")?;
    let symbol =
        Symbol::try_new(symbol_raw).ok_or(SnapshotError::InvalidField("symbol"))?;
    let next_trade_id = reader.read_u64("next_trade_id")?;
    let next_timestamp_ns = reader.read_u64("next_timestamp_ns")?;

    let bids = read_side_levels(&mut reader, Side::Buy, &symbol)?;
    let asks = read_side_levels(&mut reader, Side::Sell, &symbol)?;

    if !reader.is_exhausted() {
        return Err(SnapshotError::InvalidField("trailing bytes"));
    }

    Ok(BookSnapshot {
        symbol,
        next_trade_id,
        next_timestamp_ns,
        bids,
        asks,
    })
}

fn read_side_levels(
    reader: &mut ByteReader<'_>,
    side: Side,
    symbol: &Symbol,
) -> Result<Vec<LevelSnapshot>, SnapshotError> {
    let level_count = reader.read_u32("level count")?;
    let mut levels = Vec::with_capacity(level_count as usize);
    for _ in 0..level_count {
        let price = Price::try_new(reader.read_decimal("level price")?)
            .ok_or(SnapshotError::InvalidField("level price"))?;
        let order_count = reader.read_u32("order count")?;
        let mut orders = Vec::with_capacity(order_count as usize);
        for _ in 0..order_count {
            let order = read_order(reader, symbol)?;
            if order.side != side {
                return Err(SnapshotError::InvalidField("order side"));
            }
            orders.push(order);
        }
        levels.push(LevelSnapshot { price, orders });
    }
    Ok(levels)
}

fn read_order(reader: &mut ByteReader<'_>, symbol: &Symbol) -> Result<Order, SnapshotError> {
    let id = OrderId::new(reader.read_u64("order id")?);
    let client_order_id = ClientOrderId::new(reader.read_string("client order id")?);
    let side = match reader.read_u8("side")? {
        0 => Side::Buy,
        1 => Side::Sell,
        _ => return Err(SnapshotError::InvalidField("side")),
    };
    let order_type = match reader.read_u8("order type")? {
        0 => OrderType::Limit,
        // MARKET never rests, so it can never appear in a snapshot.
        _ => return Err(SnapshotError::InvalidField("order type")),
    };
    let time_in_force = match reader.read_u8("time in force")? {
        0 => TimeInForce::Gtc,
        1 => TimeInForce::Ioc,
        2 => TimeInForce::Fok,
        _ => return Err(SnapshotError::InvalidField("time in force")),
    };
    let price = Price::try_new(reader.read_decimal("order price")?)
        .ok_or(SnapshotError::InvalidField("order price"))?;
    let original_quantity = Quantity::try_new(reader.read_decimal("original quantity")?)
        .ok_or(SnapshotError::InvalidField("original quantity"))?;
    let remaining_quantity = Quantity::try_new(reader.read_decimal("remaining quantity")?)
        .ok_or(SnapshotError::InvalidField("remaining quantity"))?;
    let ingest_timestamp_ns = reader.read_u64("ingest timestamp")?;

    let mut order = Order::new(
        id,
        client_order_id,
        // Client identity is transport-scoped and not persisted.
        ClientId::anonymous(),
        symbol.clone(),
        side,
        order_type,
        time_in_force,
        Some(price),
        original_quantity,
        ingest_timestamp_ns,
    );
    order.remaining_quantity = remaining_quantity;
    Ok(order)
}

/// Bounds-checked little-endian reader over the snapshot body.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], SnapshotError> {
        if self.pos + n > self.data.len() {
            return Err(SnapshotError::Truncated(what));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &'static str) -> Result<u8, SnapshotError> {
        Ok(self.take(1, what)?[0])
    }

    fn read_u16(&mut self, what: &'static str) -> Result<u16, SnapshotError> {
        Ok(u16::from_le_bytes(self.take(2, what)?.try_into().unwrap()))
    }

    fn read_u32(&mut self, what: &'static str) -> Result<u32, SnapshotError> {
        Ok(u32::from_le_bytes(self.take(4, what)?.try_into().unwrap()))
    }

    fn read_u64(&mut self, what: &'static str) -> Result<u64, SnapshotError> {
        Ok(u64::from_le_bytes(self.take(8, what)?.try_into().unwrap()))
    }

    fn read_decimal(&mut self, what: &'static str) -> Result<Decimal, SnapshotError> {
        let bytes: [u8; 16] = self.take(16, what)?.try_into().unwrap();
        Ok(Decimal::deserialize(bytes))
    }

    fn read_string(&mut self, what: &'static str) -> Result<String, SnapshotError> {
        let len = self.read_u16(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SnapshotError::InvalidField(what))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

// ── File I/O ────────────────────────────────────────────────────────

/// Writes snapshots atomically: temp file, fsync, rename.
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &BookSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = encode(snapshot);
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        info!(
            path = %self.path.display(),
            bytes = data.len(),
            bid_levels = snapshot.bids.len(),
            ask_levels = snapshot.asks.len(),
            "Book snapshot written"
        );
        Ok(())
    }
}

/// Loads a snapshot from disk, verifying integrity.
pub struct SnapshotLoader {
    path: PathBuf,
}

impl SnapshotLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the snapshot. A missing file is `Ok(None)` — starting with an
    /// empty book is normal. A present-but-unreadable file is an error.
    pub fn load(&self) -> Result<Option<BookSnapshot>, SnapshotError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let snapshot = decode(&data)?;
        info!(
            path = %self.path.display(),
            next_trade_id = snapshot.next_trade_id,
            "Book snapshot restored"
        );
        Ok(Some(snapshot))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
