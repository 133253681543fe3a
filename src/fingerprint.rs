// Fingerprint - Framer + windowed FFT + log-scaled bucketer.
//
// Feeds i16 PCM samples into an overlapped window buffer; once the window
// fills, produces a Hamming-windowed FFT magnitude spectrum and summarizes it
// into `bucket_count` log-spaced (or linear-spaced) buckets.
//
// Shaped like a `apply_hann_window`/`compute_spectrum`/`bin_spectrum`
// pipeline, swapping Hann for the Hamming window AudioId uses and replacing
// linear bucketing with log-scale bucketing, per the exact windowing
// constant, overlap-restart behavior, and sample normalization AudioId's
// fingerprinting relies on.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Hamming window weight (25/46), per the original AudioId source.
const HAMMING_WEIGHT: f64 = 25.0 / 46.0;

/// Which bucketing scheme to summarize the magnitude spectrum with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketingStrategy {
    /// `s = ln(R)/ln(B)`, bucket `i` covers FFT bins `[floor(i^s), floor((i+1)^s))`.
    Log,
    /// `[0, R)` divided into `B` equal spans.
    Linear,
}

fn hamming_window(index: usize, size: usize) -> f64 {
    let w = HAMMING_WEIGHT;
    w - (1.0 - w) * (2.0 * std::f64::consts::PI * index as f64 / (size - 1) as f64).cos()
}

/// Compute the `[start, end)` FFT-bin range covered by log bucket `i` of `b`,
/// given `r` total magnitude bins.
pub fn log_bucket_range(i: usize, b: usize, r: usize) -> (usize, usize) {
    let s = (r as f64).ln() / (b as f64).ln();
    let start = ((i as f64).powf(s)).floor() as usize;
    let end = (((i + 1) as f64).powf(s)).floor() as usize;
    (start.min(r), end.min(r))
}

/// Compute the `[start, end)` FFT-bin range covered by linear bucket `i` of `b`,
/// given `r` total magnitude bins.
pub fn linear_bucket_range(i: usize, b: usize, r: usize) -> (usize, usize) {
    let start = i * r / b;
    let end = (i + 1) * r / b;
    (start, end)
}

/// Summarize a magnitude spectrum of `r` bins into `b` buckets (mean
/// magnitude per bucket range; empty ranges produce 0).
pub fn bucket_magnitudes(magnitude: &[f64], bucket_count: usize, strategy: BucketingStrategy) -> Vec<f64> {
    let r = magnitude.len();
    let mut buckets = vec![0.0; bucket_count];
    for i in 0..bucket_count {
        let (start, end) = match strategy {
            BucketingStrategy::Log => log_bucket_range(i, bucket_count, r),
            BucketingStrategy::Linear => linear_bucket_range(i, bucket_count, r),
        };
        if end > start {
            let sum: f64 = magnitude[start..end].iter().sum();
            buckets[i] = sum / (end - start) as f64;
        }
    }
    buckets
}

/// Overlapped-window FFT fingerprint extractor with log-scaled bucketing.
pub struct Fingerprint {
    window_size: usize,
    overlap: usize,
    bucket_count: usize,
    strategy: BucketingStrategy,

    sample_buffer: Vec<f64>,
    sample_offset: usize,

    weighted: Vec<Complex<f64>>,
    fft: Arc<dyn Fft<f64>>,
    count_results: usize,
    magnitude: Vec<f64>,
    buckets: Vec<f64>,
}

impl Fingerprint {
    /// `window_size` samples per FFT (typically a power of two, e.g. 2048),
    /// `bucket_count` log-spaced summary bins, `overlap` window overlap
    /// divisor (`2` = half-overlap, `1`/`0` = none).
    pub fn new(window_size: usize, bucket_count: usize, overlap: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_size);
        let count_results = window_size / 2 + 1;
        Self {
            window_size,
            overlap: overlap.max(1),
            bucket_count,
            strategy: BucketingStrategy::Log,
            sample_buffer: vec![0.0; window_size],
            sample_offset: 0,
            weighted: vec![Complex::new(0.0, 0.0); window_size],
            fft,
            count_results,
            magnitude: vec![0.0; count_results],
            buckets: vec![0.0; bucket_count],
        }
    }

    pub fn with_strategy(mut self, strategy: BucketingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn count_results(&self) -> usize {
        self.count_results
    }

    fn is_full(&self) -> bool {
        self.sample_offset >= self.window_size
    }

    /// Feed samples into the window buffer, returning the count actually
    /// consumed (the caller loops with the remainder). An empty slice never
    /// restarts the buffer and always returns 0.
    pub fn add_samples(&mut self, samples: &[i16]) -> usize {
        if samples.is_empty() {
            return 0;
        }

        if self.is_full() {
            if self.overlap > 1 {
                let offset = self.window_size / self.overlap;
                let length = self.window_size - offset;
                self.sample_buffer.copy_within(offset.., 0);
                self.sample_offset = length;
            } else {
                self.sample_offset = 0;
            }
        }

        let samples_remaining = self.window_size - self.sample_offset;
        let samples_used = samples.len().min(samples_remaining);

        for (i, &sample) in samples[..samples_used].iter().enumerate() {
            self.sample_buffer[self.sample_offset + i] = sample as f64 / 32768.0;
        }
        self.sample_offset += samples_used;

        if self.is_full() {
            self.compute();
        }

        samples_used
    }

    fn compute(&mut self) {
        for i in 0..self.window_size {
            let weight = hamming_window(i, self.window_size);
            self.weighted[i] = Complex::new(weight * self.sample_buffer[i], 0.0);
        }

        self.fft.process(&mut self.weighted);

        for i in 0..self.count_results {
            self.magnitude[i] = self.weighted[i].norm();
        }

        self.buckets = bucket_magnitudes(&self.magnitude, self.bucket_count, self.strategy);
    }

    /// The latest magnitude spectrum, if a full window has been accumulated.
    pub fn magnitude(&self) -> Option<&[f64]> {
        self.is_full().then_some(&self.magnitude)
    }

    /// The latest bucket vector, if a full window has been accumulated.
    pub fn buckets(&self) -> Option<&[f64]> {
        self.is_full().then_some(&self.buckets)
    }
}
