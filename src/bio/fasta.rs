use crate::bio::sequence::Sequence;
use crate::SplaceError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{line_ending, not_line_ending},
    combinator::{map, opt},
    sequence::preceded,
    IResult,
};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Parse a FASTA header line
fn parse_header(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = map(
        take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'),
        |s| std::str::from_utf8(s).unwrap_or(""),
    )(input)?;
    let (input, description) = opt(preceded(
        take_while1(|c: u8| c == b' ' || c == b'\t'),
        map(not_line_ending, |s| std::str::from_utf8(s).unwrap_or("")),
    ))(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, (id, description)))
}

/// Parse sequence lines until next header or EOF. Residue case is kept
/// as-is since aligners may rely on it.
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;
        // lone '\r' is not a line ending for nom
        let rest = rest.strip_prefix(b"\r").unwrap_or(rest);

        sequence.extend(line.iter().copied().filter(|c| !c.is_ascii_whitespace()));
        remaining = rest;
    }

    Ok((remaining, sequence))
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;

    let mut seq = Sequence::new(id.to_string(), sequence);
    if let Some(desc) = description.map(str::trim_end).filter(|d| !d.is_empty()) {
        seq = seq.with_description(desc.to_string());
    }

    Ok((input, seq))
}

enum FastaBuffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FastaBuffer {
    fn as_bytes(&self) -> &[u8] {
        match self {
            FastaBuffer::Mapped(mmap) => &mmap[..],
            FastaBuffer::Owned(data) => data,
        }
    }
}

/// True for a `.gz` extension in any letter case
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Lazy record iterator over one FASTA file.
///
/// A malformed record yields `Err(SplaceError::Parse)` and the reader
/// resynchronises on the next header line, so callers can log and keep going.
pub struct FastaReader {
    buffer: FastaBuffer,
    offset: usize,
}

impl FastaReader {
    /// Open a FASTA file (supports .gz compression)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SplaceError> {
        let path = path.as_ref();
        let buffer = if is_gzip(path) {
            let file = File::open(path)?;
            let mut decoder = GzDecoder::new(BufReader::new(file));
            let mut data = Vec::new();
            decoder.read_to_end(&mut data)?;
            FastaBuffer::Owned(data)
        } else {
            let file = File::open(path)?;
            if file.metadata()?.len() == 0 {
                FastaBuffer::Owned(Vec::new())
            } else {
                FastaBuffer::Mapped(unsafe { Mmap::map(&file)? })
            }
        };

        Ok(Self { buffer, offset: 0 })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            buffer: FastaBuffer::Owned(data),
            offset: 0,
        }
    }

    /// Advance to the start of the next line beginning with '>'.
    fn skip_to_next_header(&mut self) {
        let data = self.buffer.as_bytes();
        let mut pos = self.offset;
        while pos < data.len() {
            if data[pos] == b'>' && (pos == 0 || data[pos - 1] == b'\n' || data[pos - 1] == b'\r') {
                break;
            }
            pos += 1;
        }
        self.offset = pos;
    }
}

impl Iterator for FastaReader {
    type Item = Result<Sequence, SplaceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.buffer.as_bytes();
        while self.offset < data.len() && data[self.offset].is_ascii_whitespace() {
            self.offset += 1;
        }
        if self.offset >= data.len() {
            return None;
        }

        if data[self.offset] != b'>' {
            let start = self.offset;
            self.offset += 1;
            self.skip_to_next_header();
            return Some(Err(SplaceError::Parse(format!(
                "unexpected data at byte {} (expected '>')",
                start
            ))));
        }

        let input = &data[self.offset..];
        match parse_record(input) {
            Ok((remaining, seq)) => {
                self.offset = data.len() - remaining.len();
                if seq.is_empty() {
                    Some(Err(SplaceError::Parse(format!(
                        "record '{}' has no sequence",
                        seq.id
                    ))))
                } else {
                    Some(Ok(seq))
                }
            }
            Err(e) => {
                let message = format!(
                    "Failed to parse FASTA at byte {}: {:?}",
                    self.offset,
                    e.map(|err| err.code)
                );
                self.offset += 1;
                self.skip_to_next_header();
                Some(Err(SplaceError::Parse(message)))
            }
        }
    }
}

/// Parse FASTA from bytes, failing on the first malformed record
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<Sequence>, SplaceError> {
    FastaReader::from_bytes(data.to_vec()).collect()
}

/// Parse a FASTA file into sequences, failing on the first malformed record
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, SplaceError> {
    FastaReader::open(path)?.collect()
}

/// Append one unwrapped two-line record to `path`.
///
/// The entry goes out in a single `write` on an O_APPEND handle so concurrent
/// writers to the same per-gene file never interleave inside a record.
pub fn append_record<P: AsRef<Path>>(
    path: P,
    header: &str,
    sequence: &[u8],
) -> Result<(), SplaceError> {
    let mut entry = Vec::with_capacity(header.len() + sequence.len() + 3);
    entry.push(b'>');
    entry.extend_from_slice(header.as_bytes());
    entry.push(b'\n');
    entry.extend_from_slice(sequence);
    entry.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&entry)?;
    Ok(())
}
