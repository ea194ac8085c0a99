use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Exclusion range start {start} is past its end {end}")]
    Inverted { start: usize, end: usize },
}

/// An inclusive span of byte offsets, `start..=end`.
///
/// Ranges are not checked against any particular buffer; a range extending
/// past the end of an input simply excludes nothing beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: usize,
    end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

impl TryFrom<(usize, usize)> for ByteRange {
    type Error = RangeError;

    fn try_from((start, end): (usize, usize)) -> Result<Self, Self::Error> {
        ByteRange::new(start, end)
    }
}

/// Byte offsets that must never be mutated.
///
/// Ranges may overlap or arrive unsorted; the excluded positions are their union.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ranges: Vec<ByteRange>,
}

impl ExclusionSet {
    pub fn new(ranges: Vec<ByteRange>) -> Self {
        Self { ranges }
    }

    /// Builds a set from raw `(start, end)` pairs, rejecting inverted pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, RangeError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let ranges = pairs
            .into_iter()
            .map(ByteRange::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `false` when `offset` lies inside any range (both ends inclusive).
    pub fn is_fuzzable(&self, offset: usize) -> bool {
        !self.ranges.iter().any(|range| range.contains(offset))
    }

    /// Offsets in `0..len` that may be mutated, in ascending order.
    pub fn fuzzable_offsets(&self, len: usize) -> Vec<usize> {
        (0..len).filter(|&offset| self.is_fuzzable(offset)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_set() -> ExclusionSet {
        ExclusionSet::from_pairs([(0, 100), (600, 1000), (3000, 10000)]).unwrap()
    }

    #[test]
    fn fuzzable_matches_inclusive_ranges() {
        let set = scenario_set();
        for x in 0..10_000 {
            let excluded = x <= 100 || (600..=1000).contains(&x) || (3000..=10_000).contains(&x);
            assert_eq!(set.is_fuzzable(x), !excluded, "x={x}");
        }
    }

    #[test]
    fn fuzzable_spot_checks() {
        let set = scenario_set();
        assert!(!set.is_fuzzable(50));
        assert!(set.is_fuzzable(101));
        assert!(!set.is_fuzzable(700));
        assert!(!set.is_fuzzable(5000));
        assert!(!set.is_fuzzable(9999));
        assert!(set.is_fuzzable(2999));
    }

    #[test]
    fn empty_set_makes_everything_fuzzable() {
        let set = ExclusionSet::default();
        assert!(set.is_empty());
        assert!(set.is_fuzzable(0));
        assert!(set.is_fuzzable(usize::MAX));
        assert_eq!(set.fuzzable_offsets(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn overlapping_ranges_exclude_their_union() {
        let set = ExclusionSet::from_pairs([(2, 5), (4, 8), (4, 4)]).unwrap();
        assert_eq!(set.fuzzable_offsets(12), vec![0, 1, 9, 10, 11]);
    }

    #[test]
    fn out_of_bounds_range_is_tolerated() {
        let set = ExclusionSet::from_pairs([(8, 1_000)]).unwrap();
        assert_eq!(set.fuzzable_offsets(10), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn scenario_fuzzable_count() {
        // 101 + 401 + 7000 offsets excluded out of 10_000.
        assert_eq!(scenario_set().fuzzable_offsets(10_000).len(), 2498);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            ByteRange::new(10, 3),
            Err(RangeError::Inverted { start: 10, end: 3 })
        );
        assert!(ExclusionSet::from_pairs([(0, 1), (5, 4)]).is_err());
    }
}
