//! Binary training-book pipeline.
//!
//! Each input line becomes one `TrainingRecord`, written back-to-back with
//! no framing: there is no magic number, no record count, and no length
//! field. A reader must decode the fixed header to learn how many packed
//! body bytes follow, which is why `piece_count` matching the occupancy
//! popcount is a hard invariant of every record.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::board::{Board, Color};

use super::annotation::{parse_annotation, Annotation, GameResult};
use super::error::HarnessError;
use super::{handle_parse_failure, ParseErrorPolicy};

/// Fixed header length: occupancy (8) + eval (2) + result, turn, both king
/// squares, piece count (1 each).
pub const HEADER_LEN: usize = 15;

/// Training-book configuration.
#[derive(Clone, Debug, Default)]
pub struct NnBookConfig {
    pub on_parse_error: ParseErrorPolicy,
}

/// A position could not be encoded as a training record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The position has no king of this color
    MissingKing { color: Color },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::MissingKing { color } => write!(f, "position has no {color} king"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// One fixed-header + variable-body training record.
///
/// Multi-byte fields are little-endian. The body packs one 4-bit type code
/// per piece, `8 * color + piece_type`, two codes per byte with the earlier
/// square in the high nibble, squares taken in ascending index order from
/// `occupancy`. An odd piece count zero-fills the final low nibble.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingRecord {
    pub occupancy: u64,
    pub eval: i16,
    pub result: GameResult,
    /// 0 = white to move, 1 = black
    pub turn: u8,
    pub white_king: u8,
    pub black_king: u8,
    pub piece_count: u8,
    pub packed_types: Vec<u8>,
}

impl TrainingRecord {
    /// Encode a position with its annotation.
    pub fn from_board(board: &Board, annotation: Annotation) -> Result<Self, EncodeError> {
        let occupancy = board.occupancy();
        let piece_count = occupancy.popcount() as u8;

        let white_king = board
            .king_square(Color::White)
            .ok_or(EncodeError::MissingKing {
                color: Color::White,
            })?
            .as_u8();
        let black_king = board
            .king_square(Color::Black)
            .ok_or(EncodeError::MissingKing {
                color: Color::Black,
            })?
            .as_u8();

        let mut packed_types = vec![0u8; (piece_count as usize + 1) / 2];
        for (i, sq) in occupancy.iter().enumerate() {
            let (color, piece) = board
                .piece_at(sq)
                .expect("occupancy bit without a piece behind it");
            let code = (8 * color.index() + piece.index()) as u8;
            if i % 2 == 0 {
                packed_types[i / 2] = code << 4;
            } else {
                packed_types[i / 2] |= code;
            }
        }

        Ok(TrainingRecord {
            occupancy: occupancy.0,
            eval: annotation.eval,
            result: annotation.result,
            turn: u8::from(!board.white_to_move()),
            white_king,
            black_king,
            piece_count,
            packed_types,
        })
    }

    /// Total encoded length of this record in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.packed_types.len()
    }

    /// Write the record: fixed header, then the packed body, no separator.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(&self.occupancy.to_le_bytes())?;
        out.write_all(&self.eval.to_le_bytes())?;
        out.write_all(&[
            self.result.code(),
            self.turn,
            self.white_king,
            self.black_king,
            self.piece_count,
        ])?;
        out.write_all(&self.packed_types)
    }

    /// Read one record. Returns `Ok(None)` at a clean end of input and an
    /// error for truncated records or a `piece_count` that contradicts the
    /// occupancy popcount.
    pub fn read_from(input: &mut impl Read) -> io::Result<Option<Self>> {
        let mut header = [0u8; HEADER_LEN];
        let first = input.read(&mut header)?;
        if first == 0 {
            return Ok(None);
        }
        let mut filled = first;
        while filled < HEADER_LEN {
            let n = input.read(&mut header[filled..])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated record header",
                ));
            }
            filled += n;
        }

        let occupancy = u64::from_le_bytes(header[0..8].try_into().expect("8 bytes"));
        let eval = i16::from_le_bytes(header[8..10].try_into().expect("2 bytes"));
        let result = GameResult::from_code(header[10]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid result code {}", header[10]),
            )
        })?;
        let piece_count = header[14];

        if u32::from(piece_count) != occupancy.count_ones() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "piece count does not match occupancy popcount",
            ));
        }

        let mut packed_types = vec![0u8; (piece_count as usize + 1) / 2];
        input.read_exact(&mut packed_types)?;

        Ok(Some(TrainingRecord {
            occupancy,
            eval,
            result,
            turn: header[11],
            white_king: header[12],
            black_king: header[13],
            piece_count,
            packed_types,
        }))
    }
}

/// Encode every line of `input` as a training record appended to `output`.
/// Returns the number of records written.
pub fn build_training_book(
    input: &Path,
    output: &Path,
    config: &NnBookConfig,
) -> Result<u64, HarnessError> {
    let file = File::open(input).map_err(|e| HarnessError::file_open(input, e))?;
    let reader = BufReader::new(file);
    let out_file = File::create(output).map_err(|e| HarnessError::file_open(output, e))?;
    let mut writer = BufWriter::new(out_file);

    let mut written = 0u64;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let board = match Board::try_from_fen(&line) {
            Ok(board) => board,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };
        let annotation = match parse_annotation(&line) {
            Ok(annotation) => annotation,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };
        let record = match TrainingRecord::from_board(&board, annotation) {
            Ok(record) => record,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };

        record.write_to(&mut writer)?;
        written += 1;
    }

    writer.flush()?;
    info!(
        "nnbook: wrote {written} record(s) to {}",
        output.display()
    );
    Ok(written)
}
