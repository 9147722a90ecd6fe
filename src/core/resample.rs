//! Sample-rate conversion: rational polyphase FIR resampling plus a linear
//! interpolation fast path.

use crate::core::window::kaiser_window;

/// Zero crossings of the sinc kernel on each side, measured at the higher
/// of the two rates.
const HALF_ZERO_CROSSINGS: usize = 10;

/// Kaiser beta for the anti-aliasing kernel (~50 dB stopband).
const KAISER_BETA: f64 = 5.0;

/// Upper bound on `max(up, down)` when approximating an irrational ratio.
pub const MAX_RESAMPLE_FACTOR: u64 = 1000;

/// Greatest common divisor.
#[inline]
fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduces `up / down` to lowest terms.
#[inline]
pub fn reduce_ratio(up: u64, down: u64) -> (u64, u64) {
    let g = gcd(up, down).max(1);
    (up / g, down / g)
}

/// Approximates `ratio` (output rate / input rate) by `up / down` with
/// `max(up, down) <= MAX_RESAMPLE_FACTOR`, using continued-fraction
/// convergents.
///
/// Non-positive or non-finite ratios map to `(1, 1)`.
pub fn rational_ratio(ratio: f64) -> (u64, u64) {
    if !ratio.is_finite() || ratio <= 0.0 {
        return (1, 1);
    }

    // Convergents h/k of the continued fraction of `ratio`
    let (mut h_prev, mut h) = (0u64, 1u64);
    let (mut k_prev, mut k) = (1u64, 0u64);
    let mut x = ratio;
    let mut best = (1u64, 1u64);

    for _ in 0..64 {
        let a = x.floor();
        if a > MAX_RESAMPLE_FACTOR as f64 {
            break;
        }
        let a = a as u64;
        let h_next = a * h + h_prev;
        let k_next = a * k + k_prev;
        if h_next > MAX_RESAMPLE_FACTOR || k_next > MAX_RESAMPLE_FACTOR {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
        if h > 0 && k > 0 {
            best = (h, k);
        }

        let frac = x - a as f64;
        if frac < 1e-12 || ((h as f64 / k as f64) - ratio).abs() < 1e-12 * ratio {
            break;
        }
        x = 1.0 / frac;
    }

    reduce_ratio(best.0, best.1)
}

/// Output length of a polyphase resample, `ceil(input_len * up / down)`.
#[inline]
pub fn resampled_len(input_len: usize, up: u64, down: u64) -> usize {
    let num = input_len as u128 * up as u128;
    num.div_ceil(down.max(1) as u128) as usize
}

/// Polyphase FIR resampler for a fixed `up / down` ratio.
///
/// The prototype low-pass runs at `up` times the input rate with its cutoff
/// at the lower of the two Nyquist frequencies. It is split into `up`
/// sub-filters, so each output sample only touches the taps that line up
/// with real (non-inserted-zero) input samples.
#[derive(Debug, Clone)]
pub struct PolyphaseResampler {
    up: usize,
    down: usize,
    /// Delay of the prototype filter at the upsampled rate.
    half_len: usize,
    /// `phases[p][i] = h[p + i * up]`.
    phases: Vec<Vec<f32>>,
}

impl PolyphaseResampler {
    /// Builds the filter bank for `up / down` (reduced internally).
    pub fn new(up: u64, down: u64) -> Self {
        let (up, down) = reduce_ratio(up.max(1), down.max(1));
        let (up, down) = (up as usize, down as usize);
        let max_rate = up.max(down);
        let half_len = HALF_ZERO_CROSSINGS * max_rate;
        let taps = design_lowpass(2 * half_len + 1, 1.0 / max_rate as f64, up as f64);

        let mut phases: Vec<Vec<f32>> = (0..up)
            .map(|_| Vec::with_capacity(taps.len() / up + 1))
            .collect();
        for (i, &h) in taps.iter().enumerate() {
            phases[i % up].push(h);
        }

        Self {
            up,
            down,
            half_len,
            phases,
        }
    }

    /// Interpolation factor.
    #[inline]
    pub fn up(&self) -> usize {
        self.up
    }

    /// Decimation factor.
    #[inline]
    pub fn down(&self) -> usize {
        self.down
    }

    /// Resamples `input`, producing `ceil(len * up / down)` samples.
    pub fn process(&self, input: &[f32]) -> Vec<f32> {
        if input.is_empty() {
            return vec![];
        }
        if self.up == 1 && self.down == 1 {
            return input.to_vec();
        }

        let output_len = resampled_len(input.len(), self.up as u64, self.down as u64);
        let mut output = Vec::with_capacity(output_len);
        let len = input.len() as isize;

        for n in 0..output_len {
            // Position on the upsampled grid, shifted by the filter delay
            let m = n * self.down + self.half_len;
            let phase = m % self.up;
            let newest = (m / self.up) as isize;

            let mut acc = 0.0f64;
            for (i, &h) in self.phases[phase].iter().enumerate() {
                let j = newest - i as isize;
                if j < 0 {
                    break;
                }
                if j < len {
                    acc += h as f64 * input[j as usize] as f64;
                }
            }
            output.push(acc as f32);
        }

        output
    }
}

/// Kaiser-windowed sinc low-pass with `num_taps` taps, cutoff `cutoff`
/// (fraction of Nyquist), normalized to DC gain `gain`.
fn design_lowpass(num_taps: usize, cutoff: f64, gain: f64) -> Vec<f32> {
    let window = kaiser_window(num_taps, KAISER_BETA);
    let center = (num_taps as f64 - 1.0) / 2.0;

    let raw: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let x = cutoff * (i as f64 - center);
            let sinc = if x.abs() < 1e-12 {
                1.0
            } else {
                let pi_x = std::f64::consts::PI * x;
                pi_x.sin() / pi_x
            };
            cutoff * sinc * w
        })
        .collect();

    let sum: f64 = raw.iter().sum();
    let scale = if sum.abs() > 1e-12 { gain / sum } else { gain };
    raw.into_iter().map(|h| (h * scale) as f32).collect()
}

/// Resamples by `up / down` with a freshly built polyphase filter bank.
pub fn resample_poly(input: &[f32], up: u64, down: u64) -> Vec<f32> {
    PolyphaseResampler::new(up, down).process(input)
}

/// Converts between two sample rates using the exact reduced ratio.
pub fn resample_rate(input: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || from_hz == 0 || to_hz == 0 {
        return input.to_vec();
    }
    resample_poly(input, to_hz as u64, from_hz as u64)
}

/// Linear interpolation resampling to an exact output length.
///
/// No anti-aliasing filter; the cheap path for memory-constrained profiles.
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let ratio = (input.len() - 1) as f64 / (output_len.max(1) - 1).max(1) as f64;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;

        if idx + 1 < input.len() {
            output.push(input[idx] * (1.0 - frac) + input[idx + 1] * frac);
        } else {
            output.push(input[input.len() - 1]);
        }
    }

    output
}
