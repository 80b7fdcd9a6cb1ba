//! Input acquisition: file or standard input, optional gzip decompression,
//! optional replacement of malformed UTF-8.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::{debug, warn};

use crate::config::InputConfig;
use crate::error::{Result, ValidationError};
use crate::libxml2::CharEncoding;

const REPLACEMENT_CHARACTER: &[u8] = "\u{FFFD}".as_bytes();
const CHUNK_SIZE: usize = 8192;

/// Where records are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `None` and `-` both mean standard input
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            None => InputSource::Stdin,
            Some(path) if path == Path::new("-") => InputSource::Stdin,
            Some(path) => InputSource::File(path.to_path_buf()),
        }
    }

    pub fn has_gzip_suffix(&self) -> bool {
        match self {
            InputSource::Stdin => false,
            InputSource::File(path) => path.to_string_lossy().ends_with(".gz"),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin => "<stdin>".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// How the input bytes are decoded before they reach the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputOptions {
    pub gunzip: bool,
    pub replace_malformed: bool,
}

impl InputOptions {
    pub fn from_config(config: &InputConfig) -> Self {
        Self {
            gunzip: config.gunzip,
            replace_malformed: config.replace_malformed,
        }
    }

    /// Repaired input is always UTF-8, so the parser must not trust the declaration
    pub fn encoding(&self) -> CharEncoding {
        if self.replace_malformed {
            CharEncoding::Utf8
        } else {
            CharEncoding::Detect
        }
    }
}

/// Open `source` and stack the requested decoders on top of it.
///
/// Gzip is applied when requested or when the file name ends in `.gz`.
pub fn open_input(source: &InputSource, options: &InputOptions) -> Result<Box<dyn Read>> {
    let raw: Box<dyn Read> = match source {
        InputSource::Stdin => Box::new(io::stdin().lock()),
        InputSource::File(path) => {
            let file = File::open(path).map_err(|source| ValidationError::InputOpen {
                path: path.clone(),
                source,
            })?;
            Box::new(file)
        }
    };

    let gunzip = options.gunzip || source.has_gzip_suffix();
    debug!(
        "Reading {} (gunzip: {}, replace malformed: {})",
        source.display_name(),
        gunzip,
        options.replace_malformed
    );

    let decoded: Box<dyn Read> = if gunzip {
        Box::new(MultiGzDecoder::new(raw))
    } else {
        Box::new(BufReader::new(raw))
    };

    if options.replace_malformed {
        Ok(Box::new(ReplaceMalformed::new(decoded)))
    } else {
        Ok(decoded)
    }
}

/// Streaming reader that passes valid UTF-8 through and substitutes U+FFFD
/// for each malformed sequence.
///
/// A sequence cut off by a chunk boundary is held back until the next chunk
/// completes it; one still incomplete at end of input is replaced.
pub struct ReplaceMalformed<R> {
    inner: R,
    pending: Vec<u8>,
    decoded: Vec<u8>,
    decoded_pos: usize,
    eof: bool,
    replacements: u64,
    reported: bool,
}

impl<R: Read> ReplaceMalformed<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            decoded: Vec::new(),
            decoded_pos: 0,
            eof: false,
            replacements: 0,
            reported: false,
        }
    }

    /// Number of malformed sequences replaced so far
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn decode_pending(&mut self) {
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    self.decoded.extend_from_slice(valid.as_bytes());
                    start = self.pending.len();
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    self.decoded
                        .extend_from_slice(&self.pending[start..valid_end]);
                    match err.error_len() {
                        Some(len) => {
                            self.replace_one();
                            start = valid_end + len;
                        }
                        None if self.eof => {
                            self.replace_one();
                            start = self.pending.len();
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn replace_one(&mut self) {
        self.decoded.extend_from_slice(REPLACEMENT_CHARACTER);
        self.replacements += 1;
    }

    fn report(&mut self) {
        if !self.reported && self.replacements > 0 {
            warn!(
                "Replaced {} malformed UTF-8 sequence(s) with U+FFFD",
                self.replacements
            );
        }
        self.reported = true;
    }
}

impl<R: Read> Read for ReplaceMalformed<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.decoded_pos < self.decoded.len() {
                let available = &self.decoded[self.decoded_pos..];
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.decoded_pos += n;
                return Ok(n);
            }

            self.decoded.clear();
            self.decoded_pos = 0;

            if self.eof && self.pending.is_empty() {
                self.report();
                return Ok(0);
            }
            if !self.eof {
                self.fill()?;
            }
            self.decode_pending();
        }
    }
}
