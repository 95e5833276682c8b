#[cfg(test)]
pub mod direct;
pub mod radix2;

use lazy_static::lazy_static;
use num_complex::Complex32;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::Arc;

/// Base interface for all DFT implementations.
pub trait DFTBase: Send + Sync {
    /// Single forward transform using contiguous input/output of length `size()`.
    fn xform(&self, input: &[Complex32], output: &mut [Complex32]);

    /// Default in-place transform: temporary buffer copy.
    fn xform_inplace(&self, buffer: &mut [Complex32]) {
        let temp = buffer.to_vec();
        self.xform(&temp, buffer);
    }

    fn name(&self) -> String;
    fn size(&self) -> usize;
}

/// Twiddle factor `e^(-2πik/n)`.
pub(crate) fn w(k: usize, n: usize) -> Complex32 {
    let angle = -2.0 * PI * (k as f32) / (n as f32);
    Complex32::from_polar(1.0, angle)
}

lazy_static! {
    static ref PLAN_CACHE: Mutex<HashMap<usize, Arc<dyn DFTBase>>> = Mutex::new(HashMap::new());
}

/// Returns a DFT plan for size `n`, shared through a process-wide cache.
///
/// Only power-of-two sizes are planned; any other size yields `None`.
pub fn find_dft(n: usize) -> Option<Arc<dyn DFTBase>> {
    if !n.is_power_of_two() {
        return None;
    }

    // Cached plan lookup.
    {
        let cache = PLAN_CACHE.lock();
        if let Some(plan) = cache.get(&n) {
            return Some(plan.clone());
        }
    }

    let plan: Arc<dyn DFTBase> = Arc::new(radix2::DFTRadix2::new(n));
    log::debug!("Planned {} for N={}", plan.name(), n);

    // Cache the plan.
    let mut cache = PLAN_CACHE.lock();
    cache.insert(n, plan.clone());
    Some(plan)
}
