use std::fmt;

use crate::util::dna;

pub const FRAGMENT_WORDS: usize = 2;
pub const NT_PER_WORD: usize = 32;
/// 单个片段可容纳的最大碱基数（错误掩码同为 64 位）
pub const FRAGMENT_CAPACITY: usize = FRAGMENT_WORDS * NT_PER_WORD;

const PAIR_LOW_BITS: u64 = 0x5555_5555_5555_5555;

#[inline]
fn low_mask(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

/// 定长 2-bit 打包的核酸片段。
///
/// - 碱基按位置由低位到高位排列，每个 `u64` 存 32 个碱基；
/// - 非 ACGT 字符（通常是 N）只在 `errors` 中置位，对应的打包位保持为 0；
/// - 不变式：`len` 之外的打包位与错误位全部为 0，因此可以直接比较原始字。
///
/// 片段是值类型，需要独立副本时显式 `clone()`。
#[derive(Clone, Default, Eq)]
pub struct Fragment {
    len: usize,
    words: [u64; FRAGMENT_WORDS],
    errors: u64,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析文本。长度超过 [`FRAGMENT_CAPACITY`] 属于调用方错误，直接 panic。
    pub fn parse(text: &[u8]) -> Self {
        assert!(
            text.len() <= FRAGMENT_CAPACITY,
            "fragment capacity exceeded: {} > {}",
            text.len(),
            FRAGMENT_CAPACITY
        );
        let mut f = Fragment { len: text.len(), ..Default::default() };
        for (idx, &ch) in text.iter().enumerate() {
            match dna::to_bits(ch) {
                Some(bits) => f.words[idx / NT_PER_WORD] |= bits << ((idx % NT_PER_WORD) * 2),
                None => f.errors |= 1u64 << idx,
            }
        }
        f
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.errors != 0
    }

    #[inline]
    pub fn error_mask(&self) -> u64 {
        self.errors
    }

    #[inline]
    pub fn words(&self) -> &[u64; FRAGMENT_WORDS] {
        &self.words
    }

    /// 哈希键：首字的原始位
    #[inline]
    pub fn key(&self) -> u64 {
        self.words[0]
    }

    #[inline]
    pub fn is_error(&self, index: usize) -> bool {
        index < self.len && (self.errors >> index) & 1 == 1
    }

    #[inline]
    pub fn at(&self, index: usize) -> u64 {
        assert!(index < self.len, "fragment index {} out of range (len {})", index, self.len);
        (self.words[index / NT_PER_WORD] >> ((index % NT_PER_WORD) * 2)) & 0x3
    }

    /// 覆盖 `index` 处的碱基，同时清除该位置的错误标记
    pub fn set(&mut self, index: usize, nt: u64) {
        assert!(index < self.len, "fragment index {} out of range (len {})", index, self.len);
        let w = index / NT_PER_WORD;
        let off = (index % NT_PER_WORD) * 2;
        self.words[w] = (self.words[w] & !(0x3 << off)) | ((nt & 0x3) << off);
        self.errors &= !(1u64 << index);
    }

    /// 在 `index` 处插入碱基，其后所有碱基整体后移一位
    pub fn insert(&mut self, index: usize, nt: u64) {
        assert!(self.len < FRAGMENT_CAPACITY, "fragment capacity exceeded on insert");
        assert!(index <= self.len, "insert index {} beyond len {}", index, self.len);
        let w = index / NT_PER_WORD;
        let off = (index % NT_PER_WORD) * 2;
        // 高位字先搬，使用的是尚未修改的低位字
        for i in (w + 1..FRAGMENT_WORDS).rev() {
            self.words[i] = (self.words[i] << 2) | (self.words[i - 1] >> 62);
        }
        let low = self.words[w] & low_mask(off);
        let high = self.words[w] & !low_mask(off);
        self.words[w] = low | ((nt & 0x3) << off) | (high << 2);

        let m = low_mask(index);
        self.errors = (self.errors & m) | ((self.errors & !m) << 1);
        self.len += 1;
    }

    /// 删除 `index` 处的碱基，其后所有碱基整体前移一位
    pub fn delete(&mut self, index: usize) {
        assert!(index < self.len, "delete index {} out of range (len {})", index, self.len);
        let w = index / NT_PER_WORD;
        let off = (index % NT_PER_WORD) * 2;
        let low = self.words[w] & low_mask(off);
        let high = (self.words[w] >> 2) & !low_mask(off);
        self.words[w] = low | high;
        for i in w..FRAGMENT_WORDS - 1 {
            self.words[i] |= (self.words[i + 1] & 0x3) << 62;
            self.words[i + 1] >>= 2;
        }

        let m = low_mask(index);
        self.errors = (self.errors & m) | ((self.errors >> 1) & !m);
        self.len -= 1;
    }

    /// 截断到 `len` 个碱基，超出部分的位全部清零
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        for (w, word) in self.words.iter_mut().enumerate() {
            let first = w * NT_PER_WORD;
            if len <= first {
                *word = 0;
            } else if len < first + NT_PER_WORD {
                *word &= low_mask((len - first) * 2);
            }
        }
        self.errors &= low_mask(len);
        self.len = len;
    }

    /// 比较窗口 `[start, length)` 内的碱基，错误掩码整体比较。
    /// 任一方长度不足 `length` 时视为不等。
    pub fn equals(&self, other: &Fragment, length: usize, start: usize) -> bool {
        if self.len < length || other.len < length {
            return false;
        }
        if self.errors != other.errors {
            return false;
        }
        if start >= length {
            return true;
        }
        let first = start / NT_PER_WORD;
        let last = (length - 1) / NT_PER_WORD;
        for w in first..=last {
            let lo = if w == first { (start % NT_PER_WORD) * 2 } else { 0 };
            let hi = if w == last { (length - w * NT_PER_WORD) * 2 } else { 64 };
            let mask = low_mask(hi) & !low_mask(lo);
            if (self.words[w] ^ other.words[w]) & mask != 0 {
                return false;
            }
        }
        true
    }

    /// 与另一片段共同前缀的长度（最多比较 `limit` 个碱基，忽略错误位）
    pub fn common_prefix(&self, other: &Fragment, limit: usize) -> usize {
        let limit = limit.min(self.len).min(other.len);
        let mut n = 0usize;
        for w in 0..FRAGMENT_WORDS {
            if n >= limit {
                break;
            }
            let diff = self.words[w] ^ other.words[w];
            if diff == 0 {
                n += NT_PER_WORD;
                continue;
            }
            n += diff.trailing_zeros() as usize / 2;
            break;
        }
        n.min(limit)
    }

    /// 汉明距离。只支持单字（≤ 32 nt）片段。
    pub fn hamming_distance(&self, other: &Fragment) -> u32 {
        assert!(
            self.len <= NT_PER_WORD && other.len <= NT_PER_WORD,
            "hamming distance is only defined for single-word fragments"
        );
        let a = self.words[0] ^ other.words[0];
        ((a | (a >> 1)) & PAIR_LOW_BITS).count_ones()
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.equals(other, self.len, 0)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write as _;
        for idx in 0..self.len {
            let ch = if self.is_error(idx) { 'N' } else { dna::from_bits(self.at(idx)) as char };
            f.write_char(ch)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fragment({})", self)
    }
}
