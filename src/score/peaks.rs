// Score peak picking
// Finds local maxima of a window score sequence, one window behind the input

/// A local score maximum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Index of the peak window in the stream
    pub window_index: u64,

    pub score: f32,
}

/// Streaming local-maximum finder.
///
/// Window `i` is a peak when its score is at least `threshold`, strictly
/// greater than the score of window `i - 1` and not less than the score of
/// window `i + 1`. A window is only decided once its successor has been
/// seen, so the first and last windows of a stream are never peaks and the
/// result does not depend on how scores are batched.
#[derive(Debug, Clone)]
pub struct PeakFinder {
    threshold: f32,

    /// Score of the window before the candidate
    previous: Option<f32>,

    /// Undecided window, index and score
    candidate: Option<(u64, f32)>,

    next_index: u64,
}

impl PeakFinder {
    pub fn new(threshold: f32) -> Self {
        PeakFinder {
            threshold,
            previous: None,
            candidate: None,
            next_index: 0,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Number of scores seen so far
    pub fn num_windows(&self) -> u64 {
        self.next_index
    }

    /// Consume the next batch of scores, returning the peaks they decide
    pub fn process(&mut self, scores: &[f32]) -> Vec<Peak> {
        let mut peaks = Vec::new();

        for &score in scores {
            if let (Some(previous), Some((index, current))) = (self.previous, self.candidate) {
                if current >= self.threshold && current > previous && current >= score {
                    peaks.push(Peak {
                        window_index: index,
                        score: current,
                    });
                }
            }

            self.previous = self.candidate.map(|(_, s)| s);
            self.candidate = Some((self.next_index, score));
            self.next_index += 1;
        }

        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(peaks: &[Peak]) -> Vec<u64> {
        peaks.iter().map(|p| p.window_index).collect()
    }

    #[test]
    fn test_single_peak() {
        let mut finder = PeakFinder::new(0.5);
        let peaks = finder.process(&[0.1, 0.3, 0.9, 0.4, 0.2]);
        assert_eq!(indices(&peaks), vec![2]);
        assert_eq!(peaks[0].score, 0.9);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let mut finder = PeakFinder::new(0.5);
        assert!(finder.process(&[0.1, 0.4, 0.2]).is_empty());
    }

    #[test]
    fn test_plateau_reports_first_window() {
        let mut finder = PeakFinder::new(0.5);
        let peaks = finder.process(&[0.1, 0.8, 0.8, 0.8, 0.1]);
        assert_eq!(indices(&peaks), vec![1]);
    }

    #[test]
    fn test_stream_edges_are_never_peaks() {
        let mut finder = PeakFinder::new(0.5);
        assert!(finder.process(&[0.9, 0.1, 0.2, 0.9]).is_empty());
    }

    #[test]
    fn test_batching_does_not_change_peaks() {
        let scores = [0.0, 0.6, 0.2, 0.7, 0.7, 0.1, 0.9, 0.95, 0.3];

        let mut whole = PeakFinder::new(0.5);
        let expected = whole.process(&scores);

        let mut split = PeakFinder::new(0.5);
        let mut peaks = Vec::new();
        for batch in scores.chunks(2) {
            peaks.extend(split.process(batch));
        }
        peaks.extend(split.process(&[]));

        assert_eq!(peaks, expected);
        assert_eq!(indices(&expected), vec![1, 3, 7]);
        assert_eq!(split.num_windows(), scores.len() as u64);
    }
}
