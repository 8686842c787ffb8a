//! Text artifacts written after each pass: the normalized listing
//! (`.clean`), the index listing (`.ind`) and the binary listing (`.bin`).
use super::encoder::EncodedWord;
use super::error::Error;
use super::indexer::Index;
use super::normalizer::NormalizedLine;

/// One `origin<TAB>text` line per normalized line.
pub fn normalized_listing(lines: &[NormalizedLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}\t{}\n", line.origin_line, line))
        .collect()
}

/// A `.LABELS` section followed by a `.CODE` section.
pub fn index_listing(index: &Index) -> String {
    let mut out = String::from(".LABELS\n");
    for (name, value) in index.symbols.iter() {
        out.push_str(&format!("{}\t{}\n", name, value));
    }
    out.push_str(".CODE\n");
    for ins in &index.code {
        out.push_str(&format!("{}\t{}\t{}\n", ins.address, ins.origin_line, ins.text));
    }
    out
}

/// One 16-character word per line, optionally prefixed with its address.
pub fn binary_listing(words: &[EncodedWord], with_address: bool) -> String {
    words
        .iter()
        .map(|word| {
            if with_address {
                format!("{:016b}\t{}\n", word.address, word)
            } else {
                format!("{}\n", word)
            }
        })
        .collect()
}

/// Reads a binary listing back into words, with or without addresses.
/// Blank lines are skipped.
pub fn read_binary_listing(text: &str) -> Result<Vec<u16>, Error> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let word = line.rsplit('\t').next().unwrap_or(line).trim();
            if word.len() != 16 {
                return Err(Error::Malformed(line.to_owned()));
            }
            u16::from_str_radix(word, 2).map_err(|_| Error::Malformed(line.to_owned()))
        })
        .collect()
}
