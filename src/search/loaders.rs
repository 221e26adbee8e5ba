use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use memmap2::MmapOptions;
use needletail::parse_fastx_file;

use crate::search::data::InputMode;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TECHNICAL_TAG: &str = "read_type=technical";

/// One record read from a FASTA/FASTQ file, ready to be packed into a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedFragment {
    pub id: String,
    pub sequence: Vec<u8>,
    pub biological: bool,
}

pub fn load_fragments_from_path(
    path: &Path,
    mode: InputMode,
    accession: &str,
) -> io::Result<Vec<LoadedFragment>> {
    match mode {
        InputMode::Mmap => load_fragments_mmap(path, accession),
        InputMode::Stream => load_fragments_stream(path, accession),
    }
}

fn load_fragments_stream(path: &Path, accession: &str) -> io::Result<Vec<LoadedFragment>> {
    let mut reader = parse_fastx_file(path).map_err(io::Error::other)?;
    let mut fragments = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(io::Error::other)?;
        let header = String::from_utf8_lossy(record.id());
        let mut sequence = record.seq().into_owned();
        sequence.make_ascii_uppercase();
        fragments.push(fragment_from_header(&header, sequence, accession, fragments.len() + 1));
    }
    Ok(fragments)
}

fn load_fragments_mmap(path: &Path, accession: &str) -> io::Result<Vec<LoadedFragment>> {
    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    let data: Cow<'_, [u8]> = if mmap.starts_with(&GZIP_MAGIC) {
        let mut inflated = Vec::with_capacity(mmap.len() * 4);
        MultiGzDecoder::new(&mmap[..]).read_to_end(&mut inflated)?;
        Cow::Owned(inflated)
    } else {
        Cow::Borrowed(&mmap[..])
    };
    parse_fasta_bytes(&data, accession)
}

pub(crate) fn parse_fasta_bytes(data: &[u8], accession: &str) -> io::Result<Vec<LoadedFragment>> {
    if let Some(&first) = data.iter().find(|b| !b.is_ascii_whitespace())
        && first != b'>'
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "mmap mode reads FASTA only; use stream mode for FASTQ",
        ));
    }

    let mut fragments = Vec::new();
    let mut current_header: Option<String> = None;
    let mut sequence = Vec::new();
    let mut at_line_start = true;
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        if byte == b'\n' || byte == b'\r' {
            at_line_start = true;
            i += 1;
            continue;
        }
        if at_line_start && byte == b'>' {
            finalize_fragment(&mut current_header, &mut sequence, &mut fragments, accession);
            i += 1;
            let header_start = i;
            while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                i += 1;
            }
            current_header = Some(String::from_utf8_lossy(&data[header_start..i]).into_owned());
            at_line_start = true;
            continue;
        }
        at_line_start = false;
        if !byte.is_ascii_whitespace() {
            sequence.push(byte.to_ascii_uppercase());
        }
        i += 1;
    }
    finalize_fragment(&mut current_header, &mut sequence, &mut fragments, accession);
    Ok(fragments)
}

fn finalize_fragment(
    current_header: &mut Option<String>,
    sequence: &mut Vec<u8>,
    fragments: &mut Vec<LoadedFragment>,
    accession: &str,
) {
    if let Some(header) = current_header.take() {
        let index = fragments.len() + 1;
        fragments.push(fragment_from_header(
            &header,
            std::mem::take(sequence),
            accession,
            index,
        ));
    }
}

fn fragment_from_header(
    header: &str,
    sequence: Vec<u8>,
    accession: &str,
    index: usize,
) -> LoadedFragment {
    let mut tokens = header.split_whitespace();
    let id = tokens
        .next()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{accession}.FR{index}"));
    let biological = !tokens.any(|token| token == TECHNICAL_TAG);
    LoadedFragment {
        id,
        sequence,
        biological,
    }
}
