use crate::{geometry::Segment, nails::NailRing, Float, Step};

/// Rejects chords that would retrace a path already covered by a committed
/// chord.
///
/// A candidate is rejected when both of its ends lie closer than `threshold`
/// to the same committed chord. Since segments are convex, the whole
/// candidate then lies inside that chord's `threshold` band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapGuard<S> {
    threshold: S,
}

impl<S: Float> OverlapGuard<S> {
    pub fn new(threshold: S) -> Self {
        Self { threshold }
    }

    pub fn allowed(&self, candidate: Segment<S>, committed: &[Step], ring: &NailRing<S>) -> bool {
        committed
            .iter()
            .filter_map(|step| ring.segment(step.from, step.to))
            .all(|chord| {
                chord
                    .distance_to(&candidate.start)
                    .max(chord.distance_to(&candidate.end))
                    >= self.threshold
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::Point, verboser::Silent};

    fn ring() -> NailRing<f64> {
        NailRing::circle(8, 100.0, Point::new(100.0, 100.0), &mut Silent).unwrap()
    }

    #[test]
    fn coincident_chord_is_rejected() {
        let ring = ring();
        let guard = OverlapGuard::new(10.0);
        let committed = [Step { from: 0, to: 4 }];
        let reversed = ring.segment(4, 0).unwrap();
        assert!(!guard.allowed(reversed, &committed, &ring));
    }

    #[test]
    fn chords_sharing_one_nail_are_allowed() {
        let ring = ring();
        let guard = OverlapGuard::new(10.0);
        let committed = [Step { from: 0, to: 4 }];
        for to in [1, 2, 3, 5, 6, 7] {
            assert!(guard.allowed(ring.segment(4, to).unwrap(), &committed, &ring));
        }
    }

    #[test]
    fn near_parallel_chord_is_rejected() {
        let ring = ring();
        let guard = OverlapGuard::new(10.0);
        let committed = [Step { from: 2, to: 6 }];
        // Vertical diameter shifted by 5 pixels.
        let shifted = Segment::new(Point::new(105.0, 0.0), Point::new(105.0, 200.0));
        assert!(!guard.allowed(shifted, &committed, &ring));
        let far = Segment::new(Point::new(120.0, 0.0), Point::new(120.0, 200.0));
        assert!(guard.allowed(far, &committed, &ring));
    }

    #[test]
    fn zero_threshold_allows_everything() {
        let ring = ring();
        let guard = OverlapGuard::new(0.0);
        let committed = [Step { from: 0, to: 4 }];
        assert!(guard.allowed(ring.segment(4, 0).unwrap(), &committed, &ring));
    }

    #[test]
    fn empty_sequence_allows_everything() {
        let ring = ring();
        let guard = OverlapGuard::new(1000.0);
        assert!(guard.allowed(ring.segment(1, 5).unwrap(), &[], &ring));
    }
}
