//! Frequency-domain filtering of detector rows.
//!
//! + `kernel`: construction of the ramp kernel and of the kernels derived
//!   from it for variance propagation
//!
//! + `ramp`: the FDK ramp filter stage
//!
//! + `variance`: the variance ramp filter stage

pub mod kernel;
pub mod ramp;
pub mod variance;

pub use kernel::{RampKernel, VarianceKernel, CovarianceKernel, kernel_length};
pub use ramp::RampFilter;
pub use variance::{VarianceRampFilter, FilteredVariance};

/// Apodization window multiplied onto the ramp response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Window {
    /// No apodization: pure ramp up to the cutoff
    RamLak,
    Hann,
    Hamming,
    Cosine,
}

impl Window {

    /// Window value at `f`, for a window which falls to its end value at
    /// `cutoff`. Both frequencies are in cycles per sample.
    pub fn apodize(self, f: f64, cutoff: f64) -> f64 {
        use std::f64::consts::PI;
        let x = f / cutoff;
        match self {
            Window::RamLak  => 1.0,
            Window::Hann    => 0.5  * (1.0 + (PI * x).cos()),
            Window::Hamming => 0.54 + 0.46 * (PI * x).cos(),
            Window::Cosine  => (0.5 * PI * x).cos(),
        }
    }
}

impl FromStr for Window {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ramlak" | "ram-lak" | "ram_lak" => Ok(Window::RamLak),
            "hann"                           => Ok(Window::Hann),
            "hamming"                        => Ok(Window::Hamming),
            "cosine"                         => Ok(Window::Cosine),
            other => Err(Error::InvalidParameter(format!(
                "unknown filter type `{other}`: expected one of RamLak, Hann, Hamming, Cosine"))),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Window::RamLak  => "RamLak",
            Window::Hann    => "Hann",
            Window::Hamming => "Hamming",
            Window::Cosine  => "Cosine",
        };
        write!(f, "{name}")
    }
}

/// Ramp filter configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterConfig {
    pub window: Window,
    /// Fraction of the Nyquist frequency above which the response is zero.
    /// `0` disables apodization altogether: the plain ramp is kept up to
    /// Nyquist.
    pub cutoff: f64,
}

impl Default for FilterConfig {
    fn default() -> Self { Self { window: Window::RamLak, cutoff: 1.0 } }
}

impl FilterConfig {

    pub fn new(window: Window, cutoff: f64) -> Result<Self> {
        let config = Self { window, cutoff };
        config.validate()?;
        Ok(config)
    }

    pub fn hann(cutoff: f64) -> Result<Self> { Self::new(Window::Hann, cutoff) }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            return Err(Error::InvalidParameter(format!(
                "cutoff frequency must lie in [0, 1] (fraction of Nyquist), got {}", self.cutoff)))
        }
        Ok(())
    }

    /// Frequency response at `f` cycles per sample (Nyquist = 0.5)
    pub fn response(&self, f: f64) -> f64 {
        let f = f.abs();
        if self.cutoff == 0.0 { return f }
        let cutoff = NYQUIST * self.cutoff;
        if f > cutoff { 0.0 }
        else          { f * self.window.apodize(f, cutoff) }
    }
}

pub const NYQUIST: f64 = 0.5;

/// Zero-padded FFT convolution of every detector row with a fixed kernel.
pub(crate) struct RowConvolution {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    response: Vec<Complex<f64>>,
}

impl RowConvolution {

    pub(crate) fn new(response: Vec<Complex<f64>>) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(response.len());
        let inverse = planner.plan_fft_inverse(response.len());
        Self { forward, inverse, response }
    }

    pub(crate) fn len(&self) -> usize { self.response.len() }

    /// Convolve each row of each projection in place. The result for
    /// projection `p` is multiplied by `scale[p]`.
    pub(crate) fn convolve_rows(&self, data: &mut Array3<f32>, scale: &[f64]) {
        let n = self.len();
        let width = data.len_of(Axis(2));
        let scratch_len = self.forward.get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len());
        // rustfft's inverse transform is unnormalized
        let normalization = 1.0 / n as f64;
        data.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(scale.par_iter())
            .for_each(|(mut projection, &scale)| {
                let mut buffer  = vec![Complex::new(0.0, 0.0); n];
                let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];
                let scale = scale * normalization;
                for mut row in projection.rows_mut() {
                    for (b, &x) in buffer.iter_mut().zip(row.iter()) { *b = Complex::new(x as f64, 0.0) }
                    for b in &mut buffer[width..] { *b = Complex::new(0.0, 0.0) }
                    self.forward.process_with_scratch(&mut buffer, &mut scratch);
                    for (b, h) in buffer.iter_mut().zip(&self.response) { *b *= *h }
                    self.inverse.process_with_scratch(&mut buffer, &mut scratch);
                    for (x, b) in row.iter_mut().zip(&buffer) { *x = (b.re * scale) as f32 }
                }
            });
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::{fmt, str::FromStr, sync::Arc};

use ndarray::{Array3, Axis};
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::error::{Error, Result};
