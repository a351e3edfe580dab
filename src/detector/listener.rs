// Detection listeners
// Receivers of finalized clips

use crate::events::types::Clip;

/// Receives clips from a detector, in non-decreasing start order
pub trait ClipListener {
    fn process_clip(&mut self, clip: Clip);

    /// Called exactly once, after the final clip of a run
    fn complete_processing(&mut self) {}
}

impl<L: ClipListener + ?Sized> ClipListener for &mut L {
    fn process_clip(&mut self, clip: Clip) {
        (**self).process_clip(clip)
    }

    fn complete_processing(&mut self) {
        (**self).complete_processing()
    }
}

impl<L: ClipListener + ?Sized> ClipListener for Box<L> {
    fn process_clip(&mut self, clip: Clip) {
        (**self).process_clip(clip)
    }

    fn complete_processing(&mut self) {
        (**self).complete_processing()
    }
}

/// Listener that stores every clip it receives
#[derive(Debug, Clone, Default)]
pub struct ClipCollector {
    pub clips: Vec<Clip>,
    pub completed: bool,
}

impl ClipCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(start_index, length)` pairs of the collected clips
    pub fn extents(&self) -> Vec<(u64, u64)> {
        self.clips.iter().map(|c| (c.start_index, c.length)).collect()
    }
}

impl ClipListener for ClipCollector {
    fn process_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    fn complete_processing(&mut self) {
        self.completed = true;
    }
}

/// Adapts a closure into a listener
pub struct FnListener<F: FnMut(Clip)>(pub F);

impl<F: FnMut(Clip)> ClipListener for FnListener<F> {
    fn process_clip(&mut self, clip: Clip) {
        (self.0)(clip)
    }
}
