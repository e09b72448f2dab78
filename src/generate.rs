//! UUID version-4 generation.
//!
//! The per-UUID step is: fill a [`RandomBlock`] from the entropy handle, stamp
//! the version and variant bits according to a [`PatchPolicy`], then render the
//! canonical `8-4-4-4-12` hex form as a [`UuidString`].
//!
//! [`Generator`] owns the open entropy reader for the duration of a run and
//! reuses a single stack buffer across iterations.

use std::fmt;
use std::io::{Read, Write};

use tracing::debug;

use crate::entropy::{Source, fill_block};
use crate::error::{MkuuidError, Result};

/// Bytes in one UUID.
pub const BLOCK_LEN: usize = 16;
/// Length of the hyphenated textual form.
pub const UUID_STR_LEN: usize = 36;

/// Sixteen freshly read random octets.
pub type RandomBlock = [u8; BLOCK_LEN];

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";
const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";

/// Hyphens follow these byte indices (4-2-2-2-6 grouping).
const GROUP_ENDS: [usize; 4] = [3, 5, 7, 9];

/// How the version and variant fields are stamped into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchPolicy {
    /// Version nibble of byte 6 forced to `0100`, top bits of byte 8 to `10`.
    #[default]
    Rfc4122,
    /// Byte-for-byte reproduction of the historical `mkuuid` output: byte 8
    /// gets top bits `01`, byte 7 is overwritten with `byte6 | 0x40`, and byte 6
    /// is left random. The version digit is therefore not reliably `4`.
    Legacy,
}

impl PatchPolicy {
    pub fn apply(self, block: &mut RandomBlock) {
        match self {
            PatchPolicy::Rfc4122 => {
                block[6] = (block[6] & 0x0F) | 0x40;
                block[8] = (block[8] & 0x3F) | 0x80;
            }
            PatchPolicy::Legacy => {
                block[8] = (block[8] & 0x3F) | 0x40;
                block[7] = block[6] | 0x40;
            }
        }
    }
}

/// Letter case of the hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexCase {
    #[default]
    Upper,
    Lower,
}

/// Canonical `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` rendering of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UuidString(String);

impl UuidString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UuidString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render `block` as a hyphenated UUID string.
pub fn format_uuid(block: &RandomBlock, case: HexCase) -> UuidString {
    let digits = match case {
        HexCase::Upper => HEX_UPPER,
        HexCase::Lower => HEX_LOWER,
    };
    let mut s = String::with_capacity(UUID_STR_LEN);
    for (i, b) in block.iter().enumerate() {
        s.push(char::from(digits[usize::from(b >> 4)]));
        s.push(char::from(digits[usize::from(b & 0x0F)]));
        if GROUP_ENDS.contains(&i) {
            s.push('-');
        }
    }
    UuidString(s)
}

/// Runtime settings for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub source: Source,
    pub policy: PatchPolicy,
    pub case: HexCase,
}

/// Produces UUIDs from an open entropy reader.
pub struct Generator<R: Read> {
    reader: R,
    origin: String,
    policy: PatchPolicy,
    case: HexCase,
    block: RandomBlock,
}

impl<R: Read> Generator<R> {
    /// `origin` names the reader in diagnostics.
    pub fn new(reader: R, origin: impl Into<String>, policy: PatchPolicy, case: HexCase) -> Self {
        Self {
            reader,
            origin: origin.into(),
            policy,
            case,
            block: [0; BLOCK_LEN],
        }
    }

    /// Read, patch and format one UUID.
    pub fn next_uuid(&mut self) -> Result<UuidString> {
        fill_block(&mut self.reader, &self.origin, &mut self.block)?;
        self.policy.apply(&mut self.block);
        Ok(format_uuid(&self.block, self.case))
    }

    /// Unbounded lazy sequence; callers `take` what they need.
    pub fn iter(&mut self) -> impl Iterator<Item = Result<UuidString>> + '_ {
        std::iter::repeat_with(move || self.next_uuid())
    }

    /// Write `count` UUIDs to `out`, one per line, in generation order.
    ///
    /// Stops at the first failure; lines already written stay written. Returns
    /// the number of lines emitted.
    pub fn write_many<W: Write>(&mut self, count: u64, out: &mut W) -> Result<u64> {
        for i in 0..count {
            let uuid = self.next_uuid().inspect_err(|e| {
                debug!(emitted = i, error = %e, "generation stopped");
            })?;
            writeln!(out, "{}", uuid).map_err(MkuuidError::Output)?;
        }
        out.flush().map_err(MkuuidError::Output)?;
        Ok(count)
    }
}

/// Open the configured source, emit `count` UUIDs to `out`, and release the
/// source before returning.
pub fn generate_to<W: Write>(config: &Config, count: u64, out: &mut W) -> Result<u64> {
    let handle = config.source.open()?;
    let origin = handle.origin().to_string();
    let mut generator = Generator::new(handle, origin, config.policy, config.case);
    generator.write_many(count, out)
}
