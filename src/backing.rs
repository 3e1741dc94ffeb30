//! Shared "either memory-mapped or owned" byte storage used by every
//! on-disk array (columns, CSR offsets/data/values, string pools).

use memmap2::Mmap;

pub(crate) enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(m) => &m[..],
            Backing::Owned(v) => &v[..],
        }
    }
}
