//! Combination generator: the (web, flange) search space of a segment.
//!
//! The search space is the full cartesian product of the library's web and
//! flange tables in library order, web in the outer loop. Nothing is filtered
//! here; policy belongs to the rule engine. Every call to [`CombinationGenerator::pairs`]
//! returns a fresh iterator, so the space can be enumerated again for each
//! segment without shared cursor state.

use crate::library::{Plate, PlateLibrary};
use crate::segments::Segment;

/// Borrowed (web, flange) pair
pub type PlatePair<'a> = (&'a Plate, &'a Plate);

/// Enumerates plate pairs from a library
#[derive(Debug, Clone, Copy)]
pub struct CombinationGenerator<'a> {
    library: &'a PlateLibrary,
}

impl<'a> CombinationGenerator<'a> {
    pub fn new(library: &'a PlateLibrary) -> Self {
        CombinationGenerator { library }
    }

    /// Lazy sequence of all pairs for `segment`
    pub fn for_segment(&self, segment: &Segment) -> Pairs<'a> {
        tracing::trace!(segment = %segment.mark(), size = self.len(), "enumerating combinations");
        self.pairs()
    }

    /// Lazy sequence of all pairs, web outer, flange inner
    pub fn pairs(&self) -> Pairs<'a> {
        Pairs {
            webs: self.library.webs(),
            flanges: self.library.flanges(),
            web: 0,
            flange: 0,
        }
    }

    /// Size of the search space, |web| x |flange|
    pub fn len(&self) -> usize {
        self.library.combination_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over (web, flange) pairs in library order
#[derive(Debug, Clone)]
pub struct Pairs<'a> {
    webs: &'a [Plate],
    flanges: &'a [Plate],
    web: usize,
    flange: usize,
}

impl<'a> Iterator for Pairs<'a> {
    type Item = PlatePair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.flanges.is_empty() {
            return None;
        }
        let web = self.webs.get(self.web)?;
        let flange = &self.flanges[self.flange];

        self.flange += 1;
        if self.flange == self.flanges.len() {
            self.flange = 0;
            self.web += 1;
        }
        Some((web, flange))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.flanges.is_empty() || self.web >= self.webs.len() {
            0
        } else {
            (self.webs.len() - self.web) * self.flanges.len() - self.flange
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pairs<'_> {}

impl std::iter::FusedIterator for Pairs<'_> {}
