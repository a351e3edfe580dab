// Signal processor abstraction
// Causal, fixed-latency transforms composed into a single chain

/// A causal transform with a fixed, data-independent latency.
///
/// Processors are stateless: given `n` input samples they produce exactly
/// `n - latency` output samples (none when `n <= latency`), output `i`
/// aligned with input sample `i + latency`. Continuity across chunks is the
/// caller's job: it re-feeds the last `latency` samples of each buffer in
/// front of the next one.
pub trait SignalProcessor: Send {
    /// Number of input samples consumed before the first output appears
    fn latency(&self) -> usize;

    /// Transform `input`, returning `input.len() - latency` samples
    fn process(&self, input: &[f64]) -> Vec<f64>;

    /// Short stage name for logging
    fn name(&self) -> &'static str;
}

/// Output length of a processor with the given latency for `input_len` samples
pub fn output_len(input_len: usize, latency: usize) -> usize {
    input_len.saturating_sub(latency)
}

/// Sequence of processors applied in order.
/// Chain latency is the sum of stage latencies.
pub struct SignalProcessorChain {
    stages: Vec<Box<dyn SignalProcessor>>,
    latency: usize,
}

impl SignalProcessorChain {
    pub fn new(stages: Vec<Box<dyn SignalProcessor>>) -> Self {
        let latency = stages.iter().map(|s| s.latency()).sum();
        SignalProcessorChain { stages, latency }
    }

    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Names of the stages, in processing order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `input`.
    /// Returns an empty vector when `input` is not longer than the chain latency.
    pub fn process(&self, input: &[f64]) -> Vec<f64> {
        if input.len() <= self.latency {
            return Vec::new();
        }

        let mut stages = self.stages.iter();
        let mut signal = match stages.next() {
            Some(first) => first.process(input),
            None => return input.to_vec(),
        };

        for stage in stages {
            signal = stage.process(&signal);
        }

        debug_assert_eq!(signal.len(), input.len() - self.latency);
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums each sample with the `lag` samples before it
    struct LagSum {
        lag: usize,
    }

    impl SignalProcessor for LagSum {
        fn latency(&self) -> usize {
            self.lag
        }

        fn process(&self, input: &[f64]) -> Vec<f64> {
            (self.lag..input.len())
                .map(|i| input[i - self.lag..=i].iter().sum())
                .collect()
        }

        fn name(&self) -> &'static str {
            "lag_sum"
        }
    }

    #[test]
    fn test_chain_latency_is_sum() {
        let chain = SignalProcessorChain::new(vec![
            Box::new(LagSum { lag: 2 }),
            Box::new(LagSum { lag: 3 }),
        ]);
        assert_eq!(chain.latency(), 5);
        assert_eq!(chain.stage_names(), vec!["lag_sum", "lag_sum"]);
    }

    #[test]
    fn test_chain_output_length() {
        let chain = SignalProcessorChain::new(vec![
            Box::new(LagSum { lag: 2 }),
            Box::new(LagSum { lag: 3 }),
        ]);

        assert!(chain.process(&[1.0; 5]).is_empty());
        assert_eq!(chain.process(&[1.0; 6]).len(), 1);
        assert_eq!(chain.process(&[1.0; 100]).len(), 95);
    }

    #[test]
    fn test_chain_split_matches_whole() {
        let chain = SignalProcessorChain::new(vec![
            Box::new(LagSum { lag: 1 }),
            Box::new(LagSum { lag: 2 }),
        ]);
        let input: Vec<f64> = (0..40).map(|i| (i * i % 7) as f64).collect();
        let whole = chain.process(&input);

        // Re-feed the trailing latency samples in front of the second half
        let split = 17;
        let mut pieces = chain.process(&input[..split]);
        pieces.extend(chain.process(&input[split - chain.latency()..]));

        assert_eq!(pieces, whole);
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let chain = SignalProcessorChain::new(Vec::new());
        assert_eq!(chain.latency(), 0);
        assert_eq!(chain.process(&[1.0, 2.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_output_len_saturates() {
        assert_eq!(output_len(3, 5), 0);
        assert_eq!(output_len(8, 5), 3);
    }
}
