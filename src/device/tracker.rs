use std::collections::VecDeque;

use crate::device::Frame;

/// Turns a frame into pixel-space pointer coordinates.
///
/// Implementations preserve index identity across calls: as long as the
/// count is unchanged, index k refers to the same physical target as in
/// the previous call.
pub trait BlobTracker: Send {
    fn track(&mut self, frame: &Frame) -> Vec<(f64, f64)>;
}

/// Replays a scripted sequence of position sets; once the script runs out,
/// the final set repeats. Stands in for image-based detection in tests and
/// dry runs.
pub struct ScriptedTracker {
    script: VecDeque<Vec<(f64, f64)>>,
    last: Vec<(f64, f64)>,
}

impl ScriptedTracker {
    pub fn new(script: Vec<Vec<(f64, f64)>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }
}

impl BlobTracker for ScriptedTracker {
    fn track(&mut self, _frame: &Frame) -> Vec<(f64, f64)> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}
