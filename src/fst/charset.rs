//! 字符区间集合
//!
//! 用有序、不相交的闭区间表示字符类（字母、数字、任意字符），
//! 使得 sigma 这类"全字符"标签在合成、求差时保持有限。

use std::fmt;

const MAX_CODE: u32 = char::MAX as u32;

/// 字符集合（闭区间列表，已排序、已合并）
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    /// 空集
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// 全集（sigma）
    pub fn any() -> Self {
        Self {
            ranges: vec![(0, MAX_CODE)],
        }
    }

    pub fn single(ch: char) -> Self {
        Self::range(ch, ch)
    }

    pub fn range(lo: char, hi: char) -> Self {
        Self::from_ranges(vec![(lo as u32, hi as u32)])
    }

    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Self::from_ranges(chars.into_iter().map(|c| (c as u32, c as u32)).collect())
    }

    /// 从任意区间构造（自动排序、合并相邻区间）
    pub(crate) fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => {
                    last.1 = last.1.max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }

        Self { ranges: merged }
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        let code = ch as u32;
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < code {
                    std::cmp::Ordering::Less
                } else if lo > code {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// 若集合只含一个字符则返回它
    pub fn as_single(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(lo, hi)] if lo == hi => char::from_u32(*lo),
            _ => None,
        }
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(ranges)
    }

    pub fn intersect(&self, other: &CharSet) -> CharSet {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                result.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }

        Self { ranges: result }
    }

    pub fn complement(&self) -> CharSet {
        let mut result = Vec::new();
        let mut next = 0u32;

        for &(lo, hi) in &self.ranges {
            if lo > next {
                result.push((next, lo - 1));
            }
            next = hi.saturating_add(1);
        }
        if next <= MAX_CODE && self.ranges.last().map_or(true, |&(_, hi)| hi < MAX_CODE) {
            result.push((next, MAX_CODE));
        }

        Self { ranges: result }
    }

    pub fn difference(&self, other: &CharSet) -> CharSet {
        self.intersect(&other.complement())
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges == [(0, MAX_CODE)] {
            return write!(f, "[Σ]");
        }
        write!(f, "[")?;
        for &(lo, hi) in &self.ranges {
            let lo_ch = char::from_u32(lo).unwrap_or('?');
            let hi_ch = char::from_u32(hi).unwrap_or('?');
            if lo == hi {
                write!(f, "{:?}", lo_ch)?;
            } else {
                write!(f, "{:?}-{:?}", lo_ch, hi_ch)?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adjacent() {
        let set = CharSet::from_chars("abcxz".chars());
        assert_eq!(set.ranges(), &[('a' as u32, 'c' as u32), ('x' as u32, 'x' as u32), ('z' as u32, 'z' as u32)]);
    }

    #[test]
    fn test_intersect_and_complement() {
        let alpha = CharSet::range('a', 'z').union(&CharSet::range('A', 'Z'));
        let lower = CharSet::range('a', 'z');
        assert_eq!(alpha.intersect(&lower), lower);

        let not_lower = lower.complement();
        assert!(not_lower.contains('A'));
        assert!(!not_lower.contains('q'));
        assert_eq!(not_lower.complement(), lower);

        assert!(CharSet::any().complement().is_empty());
        assert_eq!(CharSet::empty().complement(), CharSet::any());
    }

    #[test]
    fn test_difference() {
        let digits = CharSet::range('0', '9');
        let nonzero = digits.difference(&CharSet::single('0'));
        assert!(!nonzero.contains('0'));
        assert!(nonzero.contains('7'));
        assert_eq!(CharSet::single('0').as_single(), Some('0'));
        assert_eq!(nonzero.as_single(), None);
    }
}
