//! Gradient clipping utilities

use ndarray::{ArrayViewD, ArrayViewMutD};

/// Global L2 norm over a set of gradient buffers
pub fn global_norm(grads: &[ArrayViewD<'_, f32>]) -> f32 {
    grads.iter().flat_map(|g| g.iter()).map(|&g| g * g).sum::<f32>().sqrt()
}

/// Clip gradients by global norm
///
/// Scales every gradient by `max_norm / global_norm` when the global norm
/// exceeds `max_norm`, preserving relative magnitudes across parameters.
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm(grads: &mut [ArrayViewMutD<'_, f32>], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = grads.iter().flat_map(|g| g.iter()).map(|&g| g * g).sum();
    let norm = total_norm_sq.sqrt();

    if norm > max_norm && norm > 0.0 {
        let clip_coef = max_norm / norm;
        for grad in grads.iter_mut() {
            grad.mapv_inplace(|g| g * clip_coef);
        }
    }

    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_clip_scales_down() {
        let mut a = arr1(&[3.0_f32]);
        let mut b = arr2(&[[4.0_f32]]);
        let norm = {
            let mut views = [a.view_mut().into_dyn(), b.view_mut().into_dyn()];
            clip_grad_norm(&mut views, 1.0)
        };
        assert_relative_eq!(norm, 5.0);
        assert_relative_eq!(a[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(b[[0, 0]], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_global_norm() {
        let a = arr1(&[3.0_f32]);
        let b = arr2(&[[4.0_f32]]);
        assert_relative_eq!(global_norm(&[a.view().into_dyn(), b.view().into_dyn()]), 5.0);
    }

    #[test]
    fn test_no_clip_below_threshold() {
        let mut a = arr1(&[0.3_f32, 0.4]);
        let norm = clip_grad_norm(&mut [a.view_mut().into_dyn()], 1.0);
        assert_relative_eq!(norm, 0.5);
        assert_relative_eq!(a[1], 0.4);
    }
}
