//! 序列表示：2-bit 打包片段与参考靶序列。

pub mod fragment;
pub mod target;

pub use fragment::{Fragment, FRAGMENT_CAPACITY};
pub use target::{Target, Targets};
