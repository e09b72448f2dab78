//! Entropy acquisition.
//!
//! A [`Source`] names where random bytes come from. Opening it yields an
//! [`EntropyHandle`], which owns the underlying file (or OS RNG adapter) for the
//! whole run and releases it when dropped, on success and error paths alike.
//! [`fill_block`] collects exactly one block from any reader, looping over
//! short reads.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, trace};

use crate::error::{MkuuidError, Result};
use crate::generate::{BLOCK_LEN, RandomBlock};

/// Random device read on unix hosts unless told otherwise.
pub const DEFAULT_DEVICE: &str = "/dev/urandom";

/// Where random bytes are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A readable device or file, opened once per run.
    Device(PathBuf),
    /// The operating system RNG via `rand::rngs::OsRng`.
    System,
}

impl Default for Source {
    fn default() -> Self {
        if cfg!(unix) {
            Source::Device(PathBuf::from(DEFAULT_DEVICE))
        } else {
            Source::System
        }
    }
}

impl Source {
    /// Human-readable name used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Source::Device(path) => format!("\"{}\"", path.display()),
            Source::System => "system rng".to_string(),
        }
    }

    /// Acquire the source for the duration of a run.
    ///
    /// # Errors
    /// Returns [`MkuuidError::SourceUnavailable`] carrying the path and the OS
    /// error when the device cannot be opened.
    pub fn open(&self) -> Result<EntropyHandle> {
        let inner = match self {
            Source::Device(path) => {
                let file = File::open(path).map_err(|source| {
                    debug!(path = %path.display(), error = %source, "entropy source unavailable");
                    MkuuidError::SourceUnavailable {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
                Inner::File(file)
            }
            Source::System => Inner::System(SystemRandom),
        };
        let origin = self.describe();
        debug!(%origin, "entropy source opened");
        Ok(EntropyHandle { inner, origin })
    }
}

enum Inner {
    File(File),
    System(SystemRandom),
}

/// An open entropy source. Closed exactly once, when dropped.
pub struct EntropyHandle {
    inner: Inner,
    origin: String,
}

impl EntropyHandle {
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Read for EntropyHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::File(f) => f.read(buf),
            Inner::System(r) => r.read(buf),
        }
    }
}

impl Drop for EntropyHandle {
    fn drop(&mut self) {
        debug!(origin = %self.origin, "entropy source released");
    }
}

/// `Read` adapter over the OS RNG. Every read fills the whole buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl Read for SystemRandom {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        OsRng.try_fill_bytes(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

/// Fill `block` with exactly [`BLOCK_LEN`] bytes from `reader`.
///
/// The block is zeroed first so a failed read never leaves stale bytes from a
/// previous UUID behind. Short reads are accumulated; `Interrupted` is retried.
///
/// # Errors
/// - [`MkuuidError::SourceExhausted`] if the reader hits end-of-stream first.
/// - [`MkuuidError::SourceRead`] for any other I/O error.
pub fn fill_block<R: Read>(reader: &mut R, origin: &str, block: &mut RandomBlock) -> Result<()> {
    block.fill(0);
    let mut filled = 0;
    while filled < BLOCK_LEN {
        match reader.read(&mut block[filled..]) {
            Ok(0) => {
                return Err(MkuuidError::SourceExhausted {
                    origin: origin.to_string(),
                    filled,
                });
            }
            Ok(n) => {
                if filled + n < BLOCK_LEN {
                    trace!(got = n, "short read from entropy source");
                }
                filled += n;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(MkuuidError::SourceRead {
                    origin: origin.to_string(),
                    filled,
                    source,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Hands out at most `step` bytes per read call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Flaky {
        interrupted: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn test_short_reads_are_accumulated() {
        let data: Vec<u8> = (1..=16).collect();
        let mut r = Trickle { data: data.clone(), pos: 0, step: 3 };
        let mut block = [0xAA; BLOCK_LEN];
        fill_block(&mut r, "trickle", &mut block).unwrap();
        assert_eq!(&block[..], &data[..]);
    }

    #[test]
    fn test_end_of_stream_is_an_error_and_block_zero_padded() {
        let mut r = Trickle { data: vec![0xFF; 5], pos: 0, step: 16 };
        let mut block = [0xAA; BLOCK_LEN];
        let err = fill_block(&mut r, "five-bytes", &mut block).unwrap_err();
        match err {
            MkuuidError::SourceExhausted { filled, .. } => assert_eq!(filled, 5),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(&block[..5], &[0xFF; 5]);
        assert_eq!(&block[5..], &[0u8; 11]);
    }

    #[test]
    fn test_interrupted_is_retried_then_error_propagates() {
        let mut r = Flaky { interrupted: false };
        let mut block = [0u8; BLOCK_LEN];
        let err = fill_block(&mut r, "flaky", &mut block).unwrap_err();
        assert!(matches!(err, MkuuidError::SourceRead { filled: 0, .. }));
        assert!(r.interrupted);
        assert_eq!(err.exit_code(), 17);
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-device");
        let err = match Source::Device(path.clone()).open() {
            Err(e) => e,
            Ok(_) => panic!("opening a missing path must fail"),
        };
        assert_eq!(err.exit_code(), 16);
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_finite_file_runs_dry_on_second_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x11; 20]).unwrap();
        file.flush().unwrap();

        let mut handle = Source::Device(file.path().to_path_buf()).open().unwrap();
        let origin = handle.origin().to_string();
        let mut block = [0u8; BLOCK_LEN];
        fill_block(&mut handle, &origin, &mut block).unwrap();
        assert_eq!(block, [0x11; BLOCK_LEN]);
        let err = fill_block(&mut handle, &origin, &mut block).unwrap_err();
        assert!(matches!(err, MkuuidError::SourceExhausted { filled: 4, .. }));
    }

    #[test]
    fn test_system_source_fills_block() {
        let mut handle = Source::System.open().unwrap();
        let mut a = [0u8; BLOCK_LEN];
        let mut b = [0u8; BLOCK_LEN];
        fill_block(&mut handle, "system rng", &mut a).unwrap();
        fill_block(&mut handle, "system rng", &mut b).unwrap();
        assert_ne!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn test_default_source_is_urandom_on_unix() {
        assert_eq!(Source::default(), Source::Device(PathBuf::from("/dev/urandom")));
        let mut handle = Source::default().open().unwrap();
        let mut block = [0u8; BLOCK_LEN];
        fill_block(&mut handle, DEFAULT_DEVICE, &mut block).unwrap();
    }
}
