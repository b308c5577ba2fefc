use anyhow::{anyhow, bail, Result};
use std::io::BufRead;
use std::path::Path;

use super::ReadPair;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    done: bool,
}

fn trim_eol(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: Vec::new(), done: false }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        trim_eol(&mut self.line);
        Ok(n > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        if self.done {
            return Ok(None);
        }

        // header，允许末尾空行
        loop {
            if !self.read_line()? {
                self.done = true;
                return Ok(None);
            }
            if !self.line.is_empty() {
                break;
            }
        }
        if self.line[0] != b'@' {
            bail!("FASTQ header not starting with '@'");
        }
        let header = String::from_utf8_lossy(&self.line[1..]).to_string();
        let id = header.split_whitespace().next().unwrap_or("").to_string();

        if !self.read_line()? {
            bail!("unexpected EOF after header of '{}'", id);
        }
        let seq = self.line.clone();

        if !self.read_line()? || self.line.first() != Some(&b'+') {
            bail!("missing '+' line for '{}'", id);
        }

        if !self.read_line()? {
            bail!("missing quality line for '{}'", id);
        }
        let qual = self.line.clone();
        if qual.len() != seq.len() {
            bail!("seq/qual length mismatch for '{}'", id);
        }

        Ok(Some(FastqRecord { id, seq, qual }))
    }
}

/// 同步读取 R1/R2 两个 FASTQ，逐对产出 [`ReadPair`]。
///
/// 只校验两侧记录数一致；读长是否合法由匹配阶段判定，单对读段不会中断整批处理。
pub struct PairedFastqReader<R1: BufRead, R2: BufRead> {
    r1: FastqReader<R1>,
    r2: FastqReader<R2>,
    pairs: u64,
}

impl<R1: BufRead, R2: BufRead> PairedFastqReader<R1, R2> {
    pub fn new(r1: R1, r2: R2) -> Self {
        Self { r1: FastqReader::new(r1), r2: FastqReader::new(r2), pairs: 0 }
    }

    pub fn next_pair(&mut self) -> Result<Option<ReadPair>> {
        let (a, b) = match (self.r1.next_record()?, self.r2.next_record()?) {
            (None, None) => return Ok(None),
            (Some(a), Some(b)) => (a, b),
            _ => bail!("R1/R2 FASTQ files have different record counts (after {} pairs)", self.pairs),
        };
        self.pairs += 1;
        Ok(Some(ReadPair { id: self.pairs, r1: a.seq, r2: b.seq }))
    }
}

impl<R1: BufRead, R2: BufRead> Iterator for PairedFastqReader<R1, R2> {
    type Item = Result<ReadPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair().transpose()
    }
}

pub type FilePairReader = PairedFastqReader<std::io::BufReader<std::fs::File>, std::io::BufReader<std::fs::File>>;

pub fn open_pairs(r1_path: impl AsRef<Path>, r2_path: impl AsRef<Path>) -> Result<FilePairReader> {
    let open = |p: &Path| {
        std::fs::File::open(p)
            .map(std::io::BufReader::new)
            .map_err(|e| anyhow!("cannot open FASTQ '{}': {}", p.display(), e))
    };
    Ok(PairedFastqReader::new(open(r1_path.as_ref())?, open(r2_path.as_ref())?))
}
