/// 2-bit 编码：A=0, C=1, G=2, T/U=3。
pub const A_BITS: u64 = 0;
pub const C_BITS: u64 = 1;
pub const G_BITS: u64 = 2;
pub const T_BITS: u64 = 3;

/// 非 ACGT 字符的标记值
pub const AMBIGUOUS: u8 = 0xFF;

/// ASCII → 2-bit 查找表，大小写均可，其余字符映射为 [`AMBIGUOUS`]。
pub static BASE_CODE: [u8; 256] = {
    let mut t = [AMBIGUOUS; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'c' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'g' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t[b'U' as usize] = 3;
    t[b'u' as usize] = 3;
    t
};

#[inline]
pub fn to_bits(b: u8) -> Option<u64> {
    let v = BASE_CODE[b as usize];
    if v == AMBIGUOUS { None } else { Some(v as u64) }
}

#[inline]
pub fn from_bits(bits: u64) -> u8 {
    match bits & 0x3 {
        A_BITS => b'A',
        C_BITS => b'C',
        G_BITS => b'G',
        _ => b'T',
    }
}

/// 大写化，U→T，其它非 ACGT 字符统一为 N
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&b| match b.to_ascii_uppercase() {
            up @ (b'A' | b'C' | b'G' | b'T') => up,
            b'U' => b'T',
            _ => b'N',
        })
        .collect()
}

/// 序列是否只包含 ACGT（大小写不限，U 视为 T）
pub fn is_acgt(seq: &[u8]) -> bool {
    seq.iter().all(|&b| BASE_CODE[b as usize] != AMBIGUOUS)
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}
