// Sample conversion
// Numeric sample types accepted by the detectors

/// A numeric audio sample convertible to a normalized float
pub trait Sample: Copy {
    /// Sample value with integer formats scaled to [-1.0, 1.0)
    fn to_f64(self) -> f64;

    fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}

impl Sample for i16 {
    fn to_f64(self) -> f64 {
        self as f64 / 32768.0
    }
}

impl Sample for i32 {
    fn to_f64(self) -> f64 {
        self as f64 / 2147483648.0
    }
}

impl Sample for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn to_f32(self) -> f32 {
        self
    }
}

impl Sample for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}
