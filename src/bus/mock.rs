//! In-memory I2C slave used to exercise the register transport and the
//! drivers without hardware.
//!
//! Each register index holds the byte string last written to it. A write
//! selects the register named by its leading index byte(s) and stores the
//! remaining bytes, if any; a read returns the selected register's bytes,
//! zero-padded to the requested length.

use super::i2c::I2CTransfer;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// Width of the register index at the front of every write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexWidth {
    #[default]
    Byte,
    Word,
}

/// One transfer as seen by the slave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Debug, Default)]
struct MockState {
    width: IndexWidth,
    registers: HashMap<u16, Vec<u8>>,
    selected: u16,
    transfers: Vec<Transfer>,
    write_calls: usize,
    fail_write_at: Option<usize>,
    fail_reads: bool,
    read_limit: Option<usize>,
    write_limit: Option<usize>,
}

/// Cloneable handle onto one simulated slave; clones share state so a test
/// can keep inspecting the bus after moving a clone into a device handle.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl MockBus {
    /// Slave with 8-bit register indices (TMP007 style)
    pub fn new() -> Self {
        Self::default()
    }

    /// Slave with 16-bit register indices sent high byte first (VL6180 style)
    pub fn with_word_index() -> Self {
        let bus = Self::default();
        bus.lock().width = IndexWidth::Word;
        bus
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_register(&self, index: u16, bytes: &[u8]) {
        self.lock().registers.insert(index, bytes.to_vec());
    }

    pub fn register(&self, index: u16) -> Option<Vec<u8>> {
        self.lock().registers.get(&index).cloned()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.lock().transfers.clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .transfers
            .iter()
            .filter_map(|t| match t {
                Transfer::Write(bytes) => Some(bytes.clone()),
                Transfer::Read(_) => None,
            })
            .collect()
    }

    /// Make the `nth` write call (zero based) fail with an I/O error
    pub fn fail_write_at(&self, nth: usize) {
        self.lock().fail_write_at = Some(nth);
    }

    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Cap every read at `max` bytes
    pub fn limit_read(&self, max: usize) {
        self.lock().read_limit = Some(max);
    }

    /// Cap every write at `max` bytes
    pub fn limit_write(&self, max: usize) {
        self.lock().write_limit = Some(max);
    }
}

impl I2CTransfer for MockBus {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        state.transfers.push(Transfer::Write(bytes.to_vec()));
        let call = state.write_calls;
        state.write_calls += 1;

        if state.fail_write_at == Some(call) {
            return Err(io::Error::new(io::ErrorKind::Other, "Remote I/O error"));
        }
        if let Some(max) = state.write_limit {
            if bytes.len() > max {
                return Ok(max);
            }
        }

        let (index, payload) = match (state.width, bytes) {
            (IndexWidth::Byte, [idx, rest @ ..]) => (u16::from(*idx), rest),
            (IndexWidth::Word, [hi, lo, rest @ ..]) => (u16::from_be_bytes([*hi, *lo]), rest),
            _ => return Ok(bytes.len()),
        };
        state.selected = index;
        if !payload.is_empty() {
            state.registers.insert(index, payload.to_vec());
        }
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.lock();
        state.transfers.push(Transfer::Read(buf.len()));

        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::Other, "Remote I/O error"));
        }

        let count = state.read_limit.map_or(buf.len(), |max| max.min(buf.len()));
        let stored = state.registers.get(&state.selected).cloned().unwrap_or_default();
        for (i, byte) in buf.iter_mut().take(count).enumerate() {
            *byte = stored.get(i).copied().unwrap_or(0);
        }
        Ok(count)
    }
}
