// Change detection for the pin match snapshot.
//
// Matching runs every frame but almost always produces the same result. The
// comparison here is deliberately coarse (pin path, tile key and position
// count per index); when anything differs the whole snapshot is swapped.

use std::rc::Rc;

use super::tile_matcher::PinTileMatch;

/// True when `next` should replace `previous`.
pub fn matches_changed(previous: &[PinTileMatch], next: &[PinTileMatch], force: bool) -> bool {
    if force || previous.len() != next.len() {
        return true;
    }
    previous.iter().zip(next).any(|(old, new)| {
        old.pin.path != new.pin.path
            || old.tile_key != new.tile_key
            || old.tile_positions.len() != new.tile_positions.len()
    })
}

/// Immutable match list, replaced wholesale.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    current: Rc<[PinTileMatch]>,
    generation: u64,
}

impl Default for MatchSnapshot {
    fn default() -> Self {
        Self {
            current: Rc::from(Vec::new()),
            generation: 0,
        }
    }
}

impl MatchSnapshot {
    /// Swap in `next` if it differs from the stored list (or `force`).
    /// Returns whether a swap happened.
    pub fn replace_if_changed(&mut self, next: Vec<PinTileMatch>, force: bool) -> bool {
        if !matches_changed(&self.current, &next, force) {
            return false;
        }
        self.current = Rc::from(next);
        self.generation += 1;
        true
    }

    /// Cheap handle on the current list; stays valid across later swaps.
    pub fn current(&self) -> Rc<[PinTileMatch]> {
        Rc::clone(&self.current)
    }

    /// Bumped on every swap.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pins::Pin;
    use glam::Vec2;

    fn m(path: &str, key: &str, count: usize) -> PinTileMatch {
        PinTileMatch {
            pin: Rc::new(Pin::new(path, path, 1)),
            tile_key: key.into(),
            tile_positions: vec![Vec2::ZERO; count],
        }
    }

    #[test]
    fn identical_lists_are_unchanged() {
        let a = vec![m("a", "a", 1), m("b", "b", 2)];
        assert!(!matches_changed(&a, &a.clone(), false));
    }

    #[test]
    fn moved_positions_alone_do_not_count() {
        let a = vec![m("a", "a", 1)];
        let mut b = a.clone();
        b[0].tile_positions[0] = Vec2::new(9.0, 9.0);
        assert!(!matches_changed(&a, &b, false));
    }

    #[test]
    fn any_field_difference_counts() {
        let a = vec![m("a", "a", 1)];
        assert!(matches_changed(&a, &[m("z", "a", 1)], false));
        assert!(matches_changed(&a, &[m("a", "A", 1)], false));
        assert!(matches_changed(&a, &[m("a", "a", 2)], false));
    }

    #[test]
    fn length_difference_counts_both_ways() {
        let a = vec![m("a", "a", 1)];
        let b = vec![m("a", "a", 1), m("b", "b", 1)];
        assert!(matches_changed(&a, &b, false));
        assert!(matches_changed(&b, &a, false));
        assert!(matches_changed(&[], &a, false));
    }

    #[test]
    fn force_always_counts() {
        assert!(matches_changed(&[], &[], true));
    }

    #[test]
    fn snapshot_is_swapped_not_mutated() {
        let mut snap = MatchSnapshot::default();
        assert!(!snap.replace_if_changed(Vec::new(), false));
        assert!(snap.replace_if_changed(vec![m("a", "a", 1)], false));
        let held = snap.current();
        assert!(!snap.replace_if_changed(vec![m("a", "a", 1)], false));
        assert!(Rc::ptr_eq(&held, &snap.current()));
        assert!(snap.replace_if_changed(vec![m("a", "a", 1)], true));
        assert!(!Rc::ptr_eq(&held, &snap.current()));
        assert_eq!(held.len(), 1);
        assert_eq!(snap.generation(), 2);
    }
}
