//! Convolution kernels for filtering detector rows.
//!
//! The ramp kernel is built once per run from the filter configuration and the
//! detector width. The kernels used for variance propagation are never built
//! from the configuration: they are pure functions of the ramp kernel, so they
//! cannot drift out of step with it.
//!
//! Kernels are stored in the frequency domain, with `N` coefficients where
//! `N` is the smallest power of two not less than twice the detector width.
//! Zero-padding rows to this length means that the circular convolution
//! performed via the FFT never wraps one end of a row onto the other.

/// Number of frequency coefficients needed to filter rows of `width` pixels
pub fn kernel_length(width: usize) -> Result<usize> {
    if width == 0 {
        return Err(Error::InvalidParameter("kernel length must be positive: detector has zero width".into()))
    }
    width.checked_mul(2)
        .and_then(usize::checked_next_power_of_two)
        .ok_or(Error::ResourceExhausted { what: "ramp kernel", elements: usize::MAX })
}

/// Frequency response `|f| · W(f)` of the apodized ramp filter.
///
/// Real and symmetric (`H[k] == H[N-k]`), with `H[0] == 0` exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct RampKernel {
    config: FilterConfig,
    response: Vec<f64>,
}

impl RampKernel {

    pub fn new(config: FilterConfig, width: usize) -> Result<Self> {
        config.validate()?;
        let n = kernel_length(width)?;
        let mut response = try_zeros::<f64>(n, "ramp kernel")?;
        for (k, h) in response.iter_mut().enumerate() {
            *h = config.response(frequency(k, n));
        }
        Ok(Self { config, response })
    }

    pub fn config(&self) -> FilterConfig { self.config }
    pub fn len(&self) -> usize { self.response.len() }
    pub fn is_empty(&self) -> bool { self.response.is_empty() }

    /// Frequency-domain coefficients, in FFT order
    pub fn response(&self) -> &[f64] { &self.response }

    /// Spatial taps `g = IFFT(H)` of the ramp filter. `g[m]` for negative `m`
    /// is found at `g[N + m]`.
    pub fn impulse_response(&self) -> Vec<f64> {
        let n = self.len();
        let mut buffer: Vec<Complex<f64>> = self.response.iter().map(|&h| Complex::new(h, 0.0)).collect();
        FftPlanner::new().plan_fft_inverse(n).process(&mut buffer);
        buffer.iter().map(|c| c.re / n as f64).collect()
    }

    pub(crate) fn convolution(&self) -> RowConvolution {
        RowConvolution::new(self.response.iter().map(|&h| Complex::new(h, 0.0)).collect())
    }
}

/// Kernel mapping the variance of unfiltered pixels to the variance of ramp
/// filtered pixels.
///
/// For `y = g * x` with independent noise in `x`, `Var(y) = |g|² * Var(x)`, so
/// this kernel's taps are the squared magnitudes of the ramp kernel's taps.
#[derive(Clone, Debug, PartialEq)]
pub struct VarianceKernel {
    taps: Vec<f64>,
    response: Vec<f64>,
}

impl VarianceKernel {

    pub fn from_ramp(ramp: &RampKernel) -> Self {
        let taps: Vec<f64> = ramp.impulse_response().iter().map(|g| g * g).collect();
        // Taps are even, so the transform is real
        let response = forward_transform(&taps).iter().map(|c| c.re).collect();
        Self { taps, response }
    }

    pub fn len(&self) -> usize { self.taps.len() }
    pub fn is_empty(&self) -> bool { self.taps.is_empty() }

    pub fn taps    (&self) -> &[f64] { &self.taps }
    pub fn response(&self) -> &[f64] { &self.response }

    pub(crate) fn convolution(&self) -> RowConvolution {
        RowConvolution::new(self.response.iter().map(|&h| Complex::new(h, 0.0)).collect())
    }
}

/// Kernel mapping the variance of unfiltered pixels to the covariance of
/// horizontally adjacent ramp filtered pixels, `Cov(y[n], y[n+1])`.
///
/// Taps are `c[m] = g[m] · g[m+1]`. Needed to propagate variance exactly
/// through linear interpolation between neighbouring filtered pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceKernel {
    taps: Vec<f64>,
    response: Vec<Complex<f64>>,
}

impl CovarianceKernel {

    pub fn from_ramp(ramp: &RampKernel) -> Self {
        let g = ramp.impulse_response();
        let n = g.len();
        let taps: Vec<f64> = (0..n).map(|m| g[m] * g[(m + 1) % n]).collect();
        let response = forward_transform(&taps);
        Self { taps, response }
    }

    pub fn taps(&self) -> &[f64] { &self.taps }
    pub fn response(&self) -> &[Complex<f64>] { &self.response }

    pub(crate) fn convolution(&self) -> RowConvolution {
        RowConvolution::new(self.response.clone())
    }
}

/// Frequency in cycles per sample of FFT bin `k` out of `n`
fn frequency(k: usize, n: usize) -> f64 {
    let k = if k <= n / 2 { k } else { n - k };
    k as f64 / n as f64
}

fn forward_transform(taps: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = taps.iter().map(|&t| Complex::new(t, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(buffer.len()).process(&mut buffer);
    buffer
}

// ----- Imports ------------------------------------------------------------------------------------------
use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::{Error, Result};
use crate::utils::try_zeros;
use super::{FilterConfig, RowConvolution};
