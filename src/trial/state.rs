/// Per-(zone position, pointer index) "currently inside" memory.
///
/// This is the hysteresis table behind edge-triggered dispatch: a callback
/// fires only when the stored flag flips. Resizing preserves surviving
/// entries; new zones and new pointers start outside every zone.
#[derive(Debug, Default)]
pub struct ZoneState {
    inside: Vec<Vec<bool>>,
    pointers: usize,
}

impl ZoneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow or shrink both dimensions. Growth zero-fills ("outside"),
    /// shrink truncates; entries that survive keep their value.
    pub fn resize(&mut self, zones: usize, pointers: usize) {
        self.inside.resize_with(zones, Vec::new);
        for row in &mut self.inside {
            row.resize(pointers, false);
        }
        self.pointers = pointers;
    }

    pub fn zones(&self) -> usize {
        self.inside.len()
    }

    pub fn pointers(&self) -> usize {
        self.pointers
    }

    pub fn get(&self, zone: usize, pointer: usize) -> bool {
        self.inside[zone][pointer]
    }

    pub fn set(&mut self, zone: usize, pointer: usize, inside: bool) {
        self.inside[zone][pointer] = inside;
    }
}

/// Trial bookkeeping. The number starts at 1 and never decreases.
#[derive(Debug)]
pub struct Trial {
    pub number: u32,
    pub saved: bool,
}

impl Trial {
    pub fn new() -> Self {
        Self {
            number: 1,
            saved: false,
        }
    }

    /// Advance iff the previous trial was saved. This is the only place the
    /// trial number changes.
    pub fn roll(&mut self) {
        if self.saved {
            self.number += 1;
            self.saved = false;
        }
    }
}

impl Default for Trial {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_preserves_surviving_entries_and_zero_fills_new_ones() {
        let mut state = ZoneState::new();
        state.resize(2, 2);
        state.set(1, 1, true);
        state.set(0, 0, true);

        state.resize(3, 3);
        assert!(state.get(0, 0));
        assert!(state.get(1, 1));
        assert!(!state.get(2, 2));
        assert!(!state.get(1, 2));

        state.resize(1, 1);
        assert_eq!(state.zones(), 1);
        assert_eq!(state.pointers(), 1);
        assert!(state.get(0, 0));
    }

    #[test]
    fn trial_advances_only_after_save() {
        let mut trial = Trial::new();
        assert_eq!(trial.number, 1);

        trial.roll();
        assert_eq!(trial.number, 1);

        trial.saved = true;
        trial.roll();
        assert_eq!(trial.number, 2);
        assert!(!trial.saved);

        trial.roll();
        assert_eq!(trial.number, 2);
    }
}
