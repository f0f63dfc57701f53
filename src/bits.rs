use std::fmt::{Binary, Display, Formatter};
use std::ops::Range;

/// Fixed-width bit-vector holding the truth values of every proposition at one tick.
///
/// Bit `i` stores the value of the `i`-th declared proposition. Indices at or beyond
/// [`Bits::CAPACITY`] read as `false` and panic when written.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::Bits;
///
/// let mut bits = Bits::new();
/// bits.set(1, true);
///
/// assert!(!bits.get(0));
/// assert!(bits.get(1));
/// assert_eq!(u64::from(bits), 0b10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bits(u64);

fn mask(width: usize) -> u64 {
    if width >= Bits::CAPACITY {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Bits {
    /// Number of bits that can be stored.
    pub const CAPACITY: usize = u64::BITS as usize;

    pub const fn new() -> Self {
        Self(0)
    }

    pub fn get(&self, index: usize) -> bool {
        index < Self::CAPACITY && (self.0 >> index) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < Self::CAPACITY, "bit index {} out of range", index);

        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    /// Return a copy with the bit at `index` replaced.
    pub fn with(mut self, index: usize, value: bool) -> Self {
        self.set(index, value);
        self
    }

    /// Read the bits in `range` as an unsigned integer, lowest index first.
    pub fn slice(&self, range: Range<usize>) -> u64 {
        if range.start >= range.end || range.start >= Self::CAPACITY {
            return 0;
        }

        (self.0 >> range.start) & mask(range.end - range.start)
    }

    /// Overwrite the bits in `range` with the low bits of `value`.
    ///
    /// Returns the portion of `value` that was actually stored.
    pub fn set_slice(&mut self, range: Range<usize>, value: u64) -> u64 {
        assert!(range.end <= Self::CAPACITY, "bit range {:?} out of range", range);

        if range.start >= range.end {
            return 0;
        }

        let width = mask(range.end - range.start);
        let stored = value & width;

        self.0 = (self.0 & !(width << range.start)) | (stored << range.start);
        stored
    }

    pub fn count_ones(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the first `len` bits, lowest index first.
    pub fn iter(&self, len: usize) -> impl Iterator<Item = bool> + '_ {
        (0..len).map(move |index| self.get(index))
    }
}

impl From<u64> for Bits {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Bits> for u64 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        iter.into_iter()
            .take(Self::CAPACITY)
            .enumerate()
            .fold(Bits::new(), |bits, (index, value)| bits.with(index, value))
    }
}

impl Binary for Bits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Binary::fmt(&self.0, f)
    }
}

impl Display for Bits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Bits;

    #[test]
    fn set_and_get() {
        let mut bits = Bits::new();

        bits.set(0, true);
        bits.set(5, true);
        bits.set(63, true);

        assert!(bits.get(0));
        assert!(!bits.get(1));
        assert!(bits.get(5));
        assert!(bits.get(63));
        assert!(!bits.get(64));
        assert_eq!(bits.count_ones(), 3);

        bits.set(5, false);
        assert!(!bits.get(5));
    }

    #[test]
    fn slices() {
        let mut bits = Bits::from(0b1011_0110u64);

        assert_eq!(bits.slice(1..4), 0b011);
        assert_eq!(bits.slice(4..8), 0b1011);
        assert_eq!(bits.slice(3..3), 0);
        assert_eq!(bits.slice(0..64), 0b1011_0110);

        let stored = bits.set_slice(0..4, 0b1_1001);

        assert_eq!(stored, 0b1001);
        assert_eq!(u64::from(bits), 0b1011_1001);
    }

    #[test]
    fn from_bools() {
        let bits: Bits = [true, false, true, true].into_iter().collect();

        assert_eq!(u64::from(bits), 0b1101);
        assert_eq!(bits.iter(4).collect::<Vec<_>>(), vec![true, false, true, true]);
        assert_eq!(bits.to_string(), "0b1101");
    }

    #[test]
    #[should_panic]
    fn set_out_of_range() {
        let mut bits = Bits::new();
        bits.set(Bits::CAPACITY, true);
    }
}
