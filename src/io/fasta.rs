use anyhow::Result;
use std::io::BufRead;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

/// 逐条读取 FASTA 记录（多行序列拼接、大写化，忽略空白与 `;` 注释行）
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    pending: Option<Vec<u8>>,
    done: bool,
}

fn split_header(header: &[u8]) -> (String, Option<String>) {
    let text = String::from_utf8_lossy(header);
    let text = text.trim();
    let mut parts = text.splitn(2, char::is_whitespace);
    let id = parts.next().unwrap_or("").to_string();
    let desc = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    (id, desc)
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: Vec::new(), pending: None, done: false }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        Ok(self.reader.read_until(b'\n', &mut self.line)? > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.pending.take() {
            Some(h) => h,
            None => loop {
                if !self.read_line()? {
                    self.done = true;
                    return Ok(None);
                }
                if self.line.first() == Some(&b'>') {
                    break self.line[1..].to_vec();
                }
            },
        };
        let (id, desc) = split_header(&header);

        let mut seq = Vec::new();
        loop {
            if !self.read_line()? {
                self.done = true;
                break;
            }
            match self.line.first() {
                Some(b'>') => {
                    self.pending = Some(self.line[1..].to_vec());
                    break;
                }
                Some(b';') => continue,
                _ => seq.extend(
                    self.line
                        .iter()
                        .filter(|b| !b.is_ascii_whitespace())
                        .map(u8::to_ascii_uppercase),
                ),
            }
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
