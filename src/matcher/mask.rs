use serde::{Deserialize, Serialize};

/// R1 开头的 handle 长度
pub const HANDLE_LEN: usize = 4;

/// 实验通道，由 handle 的嘌呤/嘧啶模式决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    /// RRRY
    Treated,
    /// YYYR
    Untreated,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Treated, Channel::Untreated];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Treated => "RRRY",
            Channel::Untreated => "YYYR",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Purine,
    Pyrimidine,
    Other,
}

#[inline]
fn class(b: u8) -> Class {
    match b {
        b'A' | b'G' => Class::Purine,
        b'C' | b'T' => Class::Pyrimidine,
        _ => Class::Other,
    }
}

/// 前三位同为嘌呤且第四位为嘧啶 => Treated；反之 => Untreated；其余为 `None`
pub fn classify(handle: &[u8]) -> Option<Channel> {
    if handle.len() < HANDLE_LEN {
        return None;
    }
    let head = class(handle[0]);
    if head == Class::Other || handle[1..3].iter().any(|&b| class(b) != head) {
        return None;
    }
    match (head, class(handle[3])) {
        (Class::Purine, Class::Pyrimidine) => Some(Channel::Treated),
        (Class::Pyrimidine, Class::Purine) => Some(Channel::Untreated),
        _ => None,
    }
}
