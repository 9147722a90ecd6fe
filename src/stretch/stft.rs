//! Centred STFT framing and normalized overlap-add synthesis.

use crate::core::fft::{WINDOW_SUM_EPSILON, WINDOW_SUM_FLOOR_RATIO};

/// Slices a signal into overlapping, windowed, centred frames.
///
/// Frame `i` is centred on input sample `i * hop`; reads before the start or
/// past the end of the signal are zero. Framing is lazy and restartable:
/// [`Framer::frames`] can be called any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Framer<'a> {
    signal: &'a [f32],
    window: &'a [f32],
    hop: usize,
}

impl<'a> Framer<'a> {
    /// Creates a framer. The frame size is the window length.
    pub fn new(signal: &'a [f32], window: &'a [f32], hop: usize) -> Self {
        Self {
            signal,
            window,
            hop: hop.max(1),
        }
    }

    /// Frame size in samples.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.window.len()
    }

    /// Hop between successive frames.
    #[inline]
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of frames, `ceil(len / hop) + 1`.
    #[inline]
    pub fn num_frames(&self) -> usize {
        num_frames(self.signal.len(), self.hop)
    }

    /// Writes windowed frame `index` into `out` (length `frame_size()`).
    pub fn frame_into(&self, index: usize, out: &mut [f32]) {
        let pad = self.window.len() / 2;
        let start = (index * self.hop) as isize - pad as isize;
        let len = self.signal.len() as isize;
        for (k, (slot, &w)) in out.iter_mut().zip(self.window.iter()).enumerate() {
            let pos = start + k as isize;
            *slot = if pos >= 0 && pos < len {
                self.signal[pos as usize] * w
            } else {
                0.0
            };
        }
    }

    /// Iterates over all frames, allocating one `Vec` per frame.
    pub fn frames(&self) -> FrameIter<'a> {
        FrameIter {
            framer: *self,
            next: 0,
        }
    }
}

/// Lazy iterator over the frames of a [`Framer`].
#[derive(Debug, Clone)]
pub struct FrameIter<'a> {
    framer: Framer<'a>,
    next: usize,
}

impl Iterator for FrameIter<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.framer.num_frames() {
            return None;
        }
        let mut frame = vec![0.0; self.framer.frame_size()];
        self.framer.frame_into(self.next, &mut frame);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.framer.num_frames().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIter<'_> {}

/// Number of centred frames covering `len` samples at the given hop.
#[inline]
pub fn num_frames(len: usize, hop: usize) -> usize {
    len.div_ceil(hop.max(1)) + 1
}

/// Accumulates synthesized frames and normalizes by the summed squared
/// window at each position.
///
/// Frame `i` lands centred on output sample `i * hop`, matching the
/// [`Framer`] layout, so the `frame_size / 2` front padding is trimmed by
/// [`OverlapAdd::finish`].
#[derive(Debug, Clone)]
pub struct OverlapAdd<'a> {
    window: &'a [f32],
    hop: usize,
    output: Vec<f32>,
    window_sum: Vec<f32>,
}

impl<'a> OverlapAdd<'a> {
    /// Prepares an accumulator for `num_frames` frames.
    pub fn new(window: &'a [f32], hop: usize, num_frames: usize) -> Self {
        let hop = hop.max(1);
        let padded_len = num_frames.saturating_sub(1) * hop + window.len();
        Self {
            window,
            hop,
            output: vec![0.0; padded_len],
            window_sum: vec![0.0; padded_len],
        }
    }

    /// Applies the synthesis window to `frame` and adds it at slot `index`.
    pub fn add_frame(&mut self, index: usize, frame: &[f32]) {
        let start = index * self.hop;
        if start >= self.output.len() {
            return;
        }
        let end = (start + self.window.len()).min(self.output.len());
        let out = &mut self.output[start..end];
        let sums = &mut self.window_sum[start..end];
        for (((o, ws), &w), &s) in out
            .iter_mut()
            .zip(sums.iter_mut())
            .zip(self.window.iter())
            .zip(frame.iter())
        {
            *o += s * w;
            *ws += w * w;
        }
    }

    /// Normalizes, trims the centring pad, and fixes the length to `length`.
    pub fn finish(self, length: usize) -> Vec<f32> {
        let Self {
            window,
            mut output,
            window_sum,
            ..
        } = self;

        normalize_output(&mut output, &window_sum);

        let pad = window.len() / 2;
        let mut trimmed: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
        trimmed.resize(length, 0.0);
        trimmed
    }
}

/// Normalizes output by window sum, clamping to prevent amplification in
/// low-overlap regions.
fn normalize_output(output: &mut [f32], window_sum: &[f32]) {
    let max_window_sum = window_sum.iter().cloned().fold(0.0f32, f32::max);
    let min_window_sum = (max_window_sum * WINDOW_SUM_FLOOR_RATIO).max(WINDOW_SUM_EPSILON);
    for (sample, &ws) in output.iter_mut().zip(window_sum.iter()) {
        *sample /= ws.max(min_window_sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::hann_window;

    #[test]
    fn test_num_frames() {
        assert_eq!(num_frames(16000, 512), 33);
        assert_eq!(num_frames(1024, 512), 3);
        assert_eq!(num_frames(1025, 512), 4);
    }

    #[test]
    fn test_frames_are_full_size_and_restartable() {
        let signal: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let window = vec![1.0f32; 256];
        let framer = Framer::new(&signal, &window, 64);

        let first: Vec<Vec<f32>> = framer.frames().collect();
        let second: Vec<Vec<f32>> = framer.frames().collect();
        assert_eq!(first.len(), framer.num_frames());
        assert_eq!(first, second);
        assert!(first.iter().all(|f| f.len() == 256));
        assert_eq!(framer.frames().len(), 1000usize.div_ceil(64) + 1);
    }

    #[test]
    fn test_frames_are_centred_and_zero_padded() {
        let signal: Vec<f32> = (1..=100).map(|i| i as f32).collect();
        let window = vec![1.0f32; 8];
        let framer = Framer::new(&signal, &window, 2);

        let mut frame = vec![0.0; 8];
        framer.frame_into(0, &mut frame);
        // First half of the first frame reads the zero pad
        assert_eq!(&frame[..4], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&frame[4..], &[1.0, 2.0, 3.0, 4.0]);

        framer.frame_into(framer.num_frames() - 1, &mut frame);
        assert!(frame[4..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_overlap_add_reconstructs_input() {
        let n_fft = 256;
        let hop = n_fft / 4;
        let window = hann_window(n_fft);
        let signal: Vec<f32> = (0..3000).map(|i| ((i as f32) * 0.013).sin() * 0.8).collect();

        let framer = Framer::new(&signal, &window, hop);
        let mut ola = OverlapAdd::new(&window, hop, framer.num_frames());
        for (i, frame) in framer.frames().enumerate() {
            ola.add_frame(i, &frame);
        }
        let rebuilt = ola.finish(signal.len());

        assert_eq!(rebuilt.len(), signal.len());
        for (i, (a, b)) in signal.iter().zip(rebuilt.iter()).enumerate() {
            assert!((a - b).abs() < 1e-4, "sample {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_finish_pads_short_output() {
        let window = hann_window(64);
        let ola = OverlapAdd::new(&window, 16, 2);
        let out = ola.finish(500);
        assert_eq!(out.len(), 500);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
