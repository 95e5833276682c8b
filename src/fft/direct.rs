use super::{w, DFTBase};
use num_complex::Complex32;

//
// Direct O(n²) evaluation, used for sizes without a fast path.
//
pub struct DFTDirect {
    n: usize,
    wtable: Vec<Complex32>,
}

impl DFTDirect {
    pub fn new(n: usize) -> Self {
        let wtable = (0..n).map(|k| w(k, n)).collect();
        Self { n, wtable }
    }
}

impl DFTBase for DFTDirect {
    fn name(&self) -> String {
        format!("Direct({})", self.n)
    }
    fn size(&self) -> usize {
        self.n
    }

    fn xform(&self, input: &[Complex32], output: &mut [Complex32]) {
        debug_assert!(input.len() >= self.n && output.len() >= self.n);

        for (k, out) in output.iter_mut().take(self.n).enumerate() {
            let mut acc = Complex32::default();
            for (j, &x) in input.iter().take(self.n).enumerate() {
                acc += x * self.wtable[(j * k) % self.n];
            }
            *out = acc;
        }
    }
}
