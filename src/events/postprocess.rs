// Transient post-processing
// Padding, merging of overlapping intervals and burst suppression

use std::collections::VecDeque;

use crate::events::types::Transient;

/// A stage that reshapes, merges or drops transients.
///
/// Stages see transients in non-decreasing start order and must keep
/// that order in their output.
pub trait EventProcessor: Send {
    fn process(&mut self, transients: Vec<Transient>) -> Vec<Transient>;

    /// Emit anything still held back at end of stream
    fn complete(&mut self) -> Vec<Transient> {
        Vec::new()
    }

    fn name(&self) -> &'static str;
}

/// Sequence of event processors applied in order
pub struct EventProcessorChain {
    stages: Vec<Box<dyn EventProcessor>>,
}

impl EventProcessorChain {
    pub fn new(stages: Vec<Box<dyn EventProcessor>>) -> Self {
        EventProcessorChain { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn process(&mut self, transients: Vec<Transient>) -> Vec<Transient> {
        self.stages
            .iter_mut()
            .fold(transients, |events, stage| stage.process(events))
    }

    /// Flush every stage, feeding each stage's leftovers through the
    /// stages after it
    pub fn complete(&mut self, transients: Vec<Transient>) -> Vec<Transient> {
        self.stages.iter_mut().fold(transients, |events, stage| {
            let mut output = stage.process(events);
            output.extend(stage.complete());
            output
        })
    }
}

/// Extends transients by padding, never moving a start below zero.
///
/// With `fixed_length` set, the padded interval is `fixed_length` samples
/// long starting `initial_padding` before the transient, and
/// `final_padding` is ignored.
#[derive(Debug, Clone)]
pub struct Padder {
    initial_padding: u64,
    final_padding: u64,
    fixed_length: Option<u64>,
}

impl Padder {
    pub fn new(initial_padding: u64, final_padding: u64) -> Self {
        Padder {
            initial_padding,
            final_padding,
            fixed_length: None,
        }
    }

    pub fn fixed_length(initial_padding: u64, length: u64) -> Self {
        Padder {
            initial_padding,
            final_padding: 0,
            fixed_length: Some(length),
        }
    }

    fn pad(&self, t: Transient) -> Option<Transient> {
        let length = self
            .fixed_length
            .unwrap_or(t.length + self.initial_padding + self.final_padding);

        let padded = if t.start_index >= self.initial_padding {
            Transient::new(t.start_index - self.initial_padding, length)
        } else {
            // Absorb the part that would fall before the stream start
            let overhang = self.initial_padding - t.start_index;
            Transient::new(0, length.saturating_sub(overhang))
        };

        (padded.length > 0).then_some(padded)
    }
}

impl EventProcessor for Padder {
    fn process(&mut self, transients: Vec<Transient>) -> Vec<Transient> {
        transients.into_iter().filter_map(|t| self.pad(t)).collect()
    }

    fn name(&self) -> &'static str {
        "padder"
    }
}

/// Merges transients whose intervals overlap or abut
#[derive(Debug, Clone, Default)]
pub struct Merger {
    pending: Option<Transient>,
}

impl Merger {
    pub fn new() -> Self {
        Merger { pending: None }
    }
}

impl EventProcessor for Merger {
    fn process(&mut self, transients: Vec<Transient>) -> Vec<Transient> {
        let mut merged = Vec::new();

        for next in transients {
            match self.pending {
                Some(prev) if next.start_index <= prev.end_index() => {
                    let end = prev.end_index().max(next.end_index());
                    log::debug!(
                        "Merging transient at {} into transient at {}",
                        next.start_index,
                        prev.start_index
                    );
                    self.pending = Some(Transient::new(prev.start_index, end - prev.start_index));
                }
                Some(prev) => {
                    merged.push(prev);
                    self.pending = Some(next);
                }
                None => self.pending = Some(next),
            }
        }

        merged
    }

    fn complete(&mut self) -> Vec<Transient> {
        self.pending.take().into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "merger"
    }
}

/// Drops transients arriving in dense bursts.
///
/// Keeps the starts of the last `count_threshold` transients seen
/// (suppressed ones included). A transient is dropped when, after its
/// start is recorded, the window is full and spans less than `period`
/// samples.
#[derive(Debug, Clone)]
pub struct Suppressor {
    count_threshold: usize,
    period: u64,
    recent_starts: VecDeque<u64>,
}

impl Suppressor {
    pub fn new(count_threshold: usize, period: u64) -> Self {
        Suppressor {
            count_threshold,
            period,
            recent_starts: VecDeque::with_capacity(count_threshold + 1),
        }
    }

    fn admit(&mut self, start_index: u64) -> bool {
        if self.count_threshold == 0 {
            return true;
        }

        self.recent_starts.push_back(start_index);
        if self.recent_starts.len() > self.count_threshold {
            self.recent_starts.pop_front();
        }

        match self.recent_starts.front() {
            Some(&oldest) if self.recent_starts.len() == self.count_threshold => {
                start_index - oldest >= self.period
            }
            _ => true,
        }
    }
}

impl EventProcessor for Suppressor {
    fn process(&mut self, transients: Vec<Transient>) -> Vec<Transient> {
        transients
            .into_iter()
            .filter(|t| {
                let keep = self.admit(t.start_index);
                if !keep {
                    log::debug!("Suppressed transient at {} in burst", t.start_index);
                }
                keep
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "suppressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padder_adds_padding() {
        let mut padder = Padder::new(100, 50);
        let out = padder.process(vec![Transient::new(1000, 200)]);
        assert_eq!(out, vec![Transient::new(900, 350)]);
    }

    #[test]
    fn test_padder_clamps_at_zero() {
        let mut padder = Padder::new(100, 50);
        let out = padder.process(vec![Transient::new(30, 200)]);
        assert_eq!(out, vec![Transient::new(0, 280)]);
    }

    #[test]
    fn test_padder_fixed_length() {
        let mut padder = Padder::fixed_length(100, 600);
        let out = padder.process(vec![Transient::new(1000, 37), Transient::new(40, 500)]);
        assert_eq!(out, vec![Transient::new(900, 600), Transient::new(0, 540)]);
    }

    #[test]
    fn test_padder_drops_empty() {
        let mut padder = Padder::fixed_length(100, 50);
        assert!(padder.process(vec![Transient::new(10, 5)]).is_empty());
    }

    #[test]
    fn test_merger_merges_overlapping_and_abutting() {
        let mut merger = Merger::new();
        let out = merger.process(vec![
            Transient::new(0, 100),
            Transient::new(50, 100),
            Transient::new(150, 10),
            Transient::new(200, 10),
        ]);
        assert_eq!(out, vec![Transient::new(0, 160)]);
        assert_eq!(merger.complete(), vec![Transient::new(200, 10)]);
        assert!(merger.complete().is_empty());
    }

    #[test]
    fn test_merger_keeps_contained_interval_end() {
        let mut merger = Merger::new();
        merger.process(vec![Transient::new(0, 100), Transient::new(10, 5)]);
        assert_eq!(merger.complete(), vec![Transient::new(0, 100)]);
    }

    #[test]
    fn test_merger_across_calls() {
        let mut merger = Merger::new();
        assert!(merger.process(vec![Transient::new(0, 100)]).is_empty());
        assert!(merger.process(vec![Transient::new(90, 100)]).is_empty());
        assert_eq!(
            merger.process(vec![Transient::new(500, 1)]),
            vec![Transient::new(0, 190)]
        );
    }

    #[test]
    fn test_merger_idempotent() {
        let input = vec![
            Transient::new(0, 100),
            Transient::new(80, 40),
            Transient::new(300, 10),
            Transient::new(305, 30),
            Transient::new(400, 1),
        ];

        let mut first = Merger::new();
        let mut once = first.process(input);
        once.extend(first.complete());

        let mut second = Merger::new();
        let mut twice = second.process(once.clone());
        twice.extend(second.complete());

        assert_eq!(twice, once);
    }

    fn evenly_spaced(count: usize, spacing: u64) -> Vec<Transient> {
        (0..count as u64)
            .map(|i| Transient::new(1000 + i * spacing, 10))
            .collect()
    }

    #[test]
    fn test_suppressor_suppresses_dense_burst() {
        // Five starts spanning period - 1 samples
        let mut suppressor = Suppressor::new(5, 401);
        let out = suppressor.process(evenly_spaced(5, 100));
        assert_eq!(out.len(), 4);
        assert_eq!(out.last().unwrap().start_index, 1300);
    }

    #[test]
    fn test_suppressor_passes_sparse_events() {
        // Five starts spanning period + 1 samples
        let mut suppressor = Suppressor::new(5, 399);
        let out = suppressor.process(evenly_spaced(5, 100));
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_suppressor_window_includes_suppressed() {
        let mut suppressor = Suppressor::new(3, 100);
        let out = suppressor.process(vec![
            Transient::new(0, 1),
            Transient::new(10, 1),
            Transient::new(20, 1),  // suppressed: 0..20
            Transient::new(30, 1),  // suppressed: 10..30
            Transient::new(125, 1), // passes: 20..125
        ]);
        let starts: Vec<u64> = out.iter().map(|t| t.start_index).collect();
        assert_eq!(starts, vec![0, 10, 125]);
    }

    #[test]
    fn test_chain_complete_flushes_through_later_stages() {
        let mut chain = EventProcessorChain::new(vec![
            Box::new(Padder::new(10, 10)),
            Box::new(Merger::new()),
            Box::new(Suppressor::new(2, 5)),
        ]);
        assert_eq!(chain.stage_names(), vec!["padder", "merger", "suppressor"]);

        assert!(chain.process(vec![Transient::new(100, 20)]).is_empty());
        let out = chain.complete(vec![Transient::new(130, 20)]);
        assert_eq!(out, vec![Transient::new(90, 70)]);
    }
}
