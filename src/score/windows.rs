// Analysis windows
// Read-only view of a sample buffer as overlapping fixed-length windows

use crate::detector::settings::SettingsError;

/// Number of complete windows of `record_size` samples, advancing by
/// `hop_size`, that fit in `len` samples
pub fn num_windows(len: usize, record_size: usize, hop_size: usize) -> usize {
    if record_size == 0 || hop_size == 0 || len < record_size {
        0
    } else {
        (len - record_size) / hop_size + 1
    }
}

/// Overlapping windows over a borrowed buffer.
///
/// Window `i` is `samples[i * hop_size..i * hop_size + record_size]`.
/// Windows are computed on demand and share the underlying samples, so
/// consecutive windows overlap whenever `hop_size < record_size`.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    samples: &'a [f32],
    record_size: usize,
    hop_size: usize,
    count: usize,
}

impl<'a> WindowView<'a> {
    pub fn new(samples: &'a [f32], record_size: usize, hop_size: usize) -> Result<Self, SettingsError> {
        if record_size == 0 {
            return Err(SettingsError::Invalid("window record size is zero".to_string()));
        }
        if hop_size == 0 {
            return Err(SettingsError::Invalid("window hop size is zero".to_string()));
        }

        Ok(WindowView {
            samples,
            record_size,
            hop_size,
            count: num_windows(samples.len(), record_size, hop_size),
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn get(&self, index: usize) -> Option<&'a [f32]> {
        if index >= self.count {
            return None;
        }
        let start = index * self.hop_size;
        Some(&self.samples[start..start + self.record_size])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [f32]> + '_ {
        (0..self.count).filter_map(move |i| self.get(i))
    }

    /// Number of leading samples no longer covered by windows after the
    /// first `count` of them
    pub fn consumed(&self, count: usize) -> usize {
        count.min(self.count) * self.hop_size
    }
}
