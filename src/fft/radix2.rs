use super::{w, DFTBase};
use num_complex::Complex32;

//
// Iterative radix-2 Cooley–Tukey transform for power-of-two sizes.
//
pub struct DFTRadix2 {
    n: usize,
    wtable: Vec<Complex32>,
    bitrev: Vec<usize>,
}

impl DFTRadix2 {
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two(), "radix-2 plan requires a power-of-two size");

        //
        // Precompute the n/2 twiddles of the largest stage; smaller stages stride into it.
        //
        let wtable = (0..n / 2).map(|k| w(k, n)).collect();

        //
        // Precompute the bit-reversal permutation.
        //
        let bits = n.trailing_zeros();
        let bitrev = (0..n)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Self { n, wtable, bitrev }
    }

    fn butterflies(&self, data: &mut [Complex32]) {
        let mut len = 2;
        while len <= self.n {
            let half = len / 2;
            let stride = self.n / len;

            for start in (0..self.n).step_by(len) {
                for k in 0..half {
                    let tw = self.wtable[k * stride];
                    let a = data[start + k];
                    let b = data[start + k + half] * tw;
                    data[start + k] = a + b;
                    data[start + k + half] = a - b;
                }
            }
            len <<= 1;
        }
    }
}

impl DFTBase for DFTRadix2 {
    fn name(&self) -> String {
        format!("Radix2({})", self.n)
    }
    fn size(&self) -> usize {
        self.n
    }

    fn xform(&self, input: &[Complex32], output: &mut [Complex32]) {
        debug_assert!(input.len() >= self.n && output.len() >= self.n);

        for (i, &x) in input.iter().take(self.n).enumerate() {
            output[self.bitrev[i]] = x;
        }
        self.butterflies(&mut output[..self.n]);
    }

    fn xform_inplace(&self, buffer: &mut [Complex32]) {
        for i in 0..self.n {
            let j = self.bitrev[i];
            if i < j {
                buffer.swap(i, j);
            }
        }
        self.butterflies(&mut buffer[..self.n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::direct::DFTDirect;
    use approx::assert_relative_eq;

    fn signal(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| Complex32::new((i as f32 * 0.37).sin(), (i as f32 * 0.11).cos() * 0.5))
            .collect()
    }

    #[test]
    fn matches_direct_evaluation() {
        for n in [1, 2, 8, 64] {
            let input = signal(n);
            let mut fast = vec![Complex32::default(); n];
            let mut slow = vec![Complex32::default(); n];

            DFTRadix2::new(n).xform(&input, &mut fast);
            DFTDirect::new(n).xform(&input, &mut slow);

            for (a, b) in fast.iter().zip(&slow) {
                assert_relative_eq!(a.re, b.re, epsilon = 1e-3);
                assert_relative_eq!(a.im, b.im, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn inplace_agrees_with_out_of_place() {
        let plan = DFTRadix2::new(32);
        let input = signal(32);
        let mut out = vec![Complex32::default(); 32];
        plan.xform(&input, &mut out);

        let mut buf = input.clone();
        plan.xform_inplace(&mut buf);
        for (a, b) in buf.iter().zip(&out) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-5);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-5);
        }
    }

    #[test]
    fn pure_tone_lands_in_its_bin() {
        let n = 256;
        let bin = 10;
        let mut buf: Vec<Complex32> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / n as f32;
                Complex32::new(phase.cos(), 0.0)
            })
            .collect();
        DFTRadix2::new(n).xform_inplace(&mut buf);

        let peak = (0..n / 2)
            .max_by(|&a, &b| buf[a].norm().total_cmp(&buf[b].norm()))
            .unwrap();
        assert_eq!(peak, bin);
        assert_relative_eq!(buf[bin].norm(), n as f32 / 2.0, epsilon = 1e-2);
    }
}
