//! Word 97-2003 binary documents.
//!
//! A `.doc` file is an OLE2 compound file. The `WordDocument` stream starts
//! with the File Information Block (FIB), which points at the piece table
//! (CLX) stored in the `0Table` or `1Table` stream. Each piece maps a run of
//! character positions to bytes in `WordDocument`, stored either as 8-bit
//! Windows-1252 ("compressed") or UTF-16LE. The main document text is the
//! first `ccpText` characters.
//!
//! Files that are really OOXML packages with a `.doc` name are read as
//! Word paragraphs instead.

use std::io::{Cursor, Read, Seek};

use cfb::CompoundFile;
use encoding_rs::{UTF_16LE, WINDOWS_1252};
use tracing::debug;

use super::{docx, ExtractionError, FormatHandler};

const WORD_IDENT: u16 = 0xA5EC;

const FIB_IDENT: usize = 0x0000;
const FIB_FLAGS: usize = 0x000A;
const FIB_CCP_TEXT: usize = 0x004C;
const FIB_FC_CLX: usize = 0x01A2;
const FIB_LCB_CLX: usize = 0x01A6;

const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub struct DocHandler;

impl FormatHandler for DocHandler {
    fn label(&self) -> &'static str {
        "DOC"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".doc"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.starts_with(ZIP_MAGIC) {
            debug!("DOC upload is an OOXML package, reading paragraphs");
            return Ok(docx::body_paragraphs(bytes)?.join("\n\n"));
        }

        let mut file = CompoundFile::open(Cursor::new(bytes))?;
        let word = read_stream(&mut file, "/WordDocument")?;
        let fib = Fib::parse(&word)?;
        if fib.encrypted {
            return Err(ExtractionError::malformed("document is encrypted"));
        }

        let table_name = if fib.which_table { "/1Table" } else { "/0Table" };
        let table = read_stream(&mut file, table_name)?;
        let clx = slice(&table, fib.fc_clx, fib.lcb_clx)
            .ok_or_else(|| ExtractionError::malformed("piece table lies outside the table stream"))?;

        let pieces = parse_pieces(clx)?;
        debug!(piece_count = pieces.len(), ccp_text = fib.ccp_text, "Decoding DOC pieces");

        let mut raw = String::new();
        for piece in &pieces {
            if piece.cp_start >= fib.ccp_text {
                break;
            }
            let chars = (piece.cp_end.min(fib.ccp_text) - piece.cp_start) as usize;
            raw.push_str(&piece.decode(&word, chars)?);
        }

        Ok(clean_text(&raw))
    }
}

struct Fib {
    encrypted: bool,
    which_table: bool,
    ccp_text: u32,
    fc_clx: usize,
    lcb_clx: usize,
}

impl Fib {
    fn parse(word: &[u8]) -> Result<Self, ExtractionError> {
        let too_short = || ExtractionError::malformed("WordDocument stream is too short");

        let ident = read_u16(word, FIB_IDENT).ok_or_else(too_short)?;
        if ident != WORD_IDENT {
            return Err(ExtractionError::malformed(format!(
                "not a Word document (identifier 0x{:04X})",
                ident
            )));
        }
        let flags = read_u16(word, FIB_FLAGS).ok_or_else(too_short)?;

        Ok(Self {
            encrypted: flags & FLAG_ENCRYPTED != 0,
            which_table: flags & FLAG_WHICH_TABLE != 0,
            ccp_text: read_u32(word, FIB_CCP_TEXT).ok_or_else(too_short)?,
            fc_clx: read_u32(word, FIB_FC_CLX).ok_or_else(too_short)? as usize,
            lcb_clx: read_u32(word, FIB_LCB_CLX).ok_or_else(too_short)? as usize,
        })
    }
}

#[derive(Debug)]
struct Piece {
    cp_start: u32,
    cp_end: u32,
    fc: u32,
}

impl Piece {
    fn decode(&self, word: &[u8], chars: usize) -> Result<String, ExtractionError> {
        let out_of_range = || ExtractionError::malformed("piece lies outside the WordDocument stream");

        if self.fc & FC_COMPRESSED != 0 {
            let offset = ((self.fc & !FC_COMPRESSED) / 2) as usize;
            let bytes = slice(word, offset, chars).ok_or_else(out_of_range)?;
            Ok(WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned())
        } else {
            let bytes = slice(word, self.fc as usize, chars * 2).ok_or_else(out_of_range)?;
            Ok(UTF_16LE.decode_without_bom_handling(bytes).0.into_owned())
        }
    }
}

/// Skip property entries (Prc) and read the piece descriptors (Pcdt).
fn parse_pieces(clx: &[u8]) -> Result<Vec<Piece>, ExtractionError> {
    let truncated = || ExtractionError::malformed("truncated piece table");

    let mut pos = 0;
    while pos < clx.len() {
        match clx[pos] {
            CLX_PRC => {
                let size = read_u16(clx, pos + 1).ok_or_else(truncated)? as usize;
                pos += 3 + size;
            }
            CLX_PCDT => {
                let lcb = read_u32(clx, pos + 1).ok_or_else(truncated)? as usize;
                let plc = slice(clx, pos + 5, lcb).ok_or_else(truncated)?;
                if lcb < 4 || (lcb - 4) % (4 + PCD_SIZE) != 0 {
                    return Err(ExtractionError::malformed("piece table has an invalid size"));
                }
                let count = (lcb - 4) / (4 + PCD_SIZE);
                let descriptors = 4 * (count + 1);

                let mut pieces = Vec::with_capacity(count);
                for i in 0..count {
                    let cp_start = read_u32(plc, 4 * i).ok_or_else(truncated)?;
                    let cp_end = read_u32(plc, 4 * (i + 1)).ok_or_else(truncated)?;
                    let fc = read_u32(plc, descriptors + i * PCD_SIZE + 2).ok_or_else(truncated)?;
                    if cp_end < cp_start {
                        return Err(ExtractionError::malformed("piece table is not ordered"));
                    }
                    pieces.push(Piece { cp_start, cp_end, fc });
                }
                return Ok(pieces);
            }
            other => {
                return Err(ExtractionError::malformed(format!(
                    "unexpected piece table entry 0x{:02X}",
                    other
                )))
            }
        }
    }

    Err(ExtractionError::malformed("piece table not found"))
}

/// Map Word's in-band control characters to plain text and drop field codes,
/// keeping field results.
fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // One entry per open field: true while still inside its code part.
    let mut fields: Vec<bool> = Vec::new();

    for ch in raw.chars() {
        match ch {
            '\u{13}' => fields.push(true),
            '\u{14}' => {
                if let Some(in_code) = fields.last_mut() {
                    *in_code = false;
                }
            }
            '\u{15}' => {
                fields.pop();
            }
            _ if fields.iter().any(|in_code| *in_code) => {}
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\u{1E}' => out.push('-'),
            '\t' | '\n' => out.push(ch),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out.trim_end_matches(['\n', '\t']).to_string()
}

fn read_stream<F: Read + Seek>(file: &mut CompoundFile<F>, path: &str) -> Result<Vec<u8>, ExtractionError> {
    if !file.is_stream(path) {
        return Err(ExtractionError::malformed(format!(
            "missing {} stream",
            path.trim_start_matches('/')
        )));
    }
    let mut stream = file.open_stream(path)?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    bytes.get(offset..offset.checked_add(len)?)
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = slice(bytes, offset, 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = slice(bytes, offset, 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
