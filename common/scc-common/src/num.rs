use std::ops::RangeInclusive;

pub trait GetBit {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;
}

macro_rules! impl_get_bit {
    ($($t:ty),* $(,)?) => {
        $(
            impl GetBit for $t {
                #[inline]
                fn bit(self, i: u8) -> bool {
                    debug_assert!(i < (<$t>::BITS as u8));
                    self & (1 << i) != 0
                }

                #[inline]
                fn bits(self, range: RangeInclusive<u8>) -> Self {
                    let start = *range.start();
                    let end = *range.end();
                    debug_assert!(end < (<$t>::BITS as u8));

                    let len = u32::from(end - start + 1);
                    let mask = if len >= <$t>::BITS { <$t>::MAX } else { (1 << len) - 1 };
                    (self >> start) & mask
                }
            }
        )*
    };
}

impl_get_bit!(u8, u16, u32, u64, usize);
