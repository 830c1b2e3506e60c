//! Per-image transforms used to build paired training views.
//!
//! All operations work on CPU-side `ndarray` buffers of shape `[H, W, C]`
//! with values in `[0, 1]`; tensors only come into play once a whole batch
//! has been assembled. Randomness is drawn from the caller's
//! [`Xorshift64`](crate::rng::Xorshift64) so view construction is
//! reproducible from the run seed.

use ndarray::{s, Array3};

use crate::rng::Xorshift64;

// ---------------------------------------------------------------------------
// Cropping
// ---------------------------------------------------------------------------

/// Remove `crop` pixels per axis, keeping the centered window.
///
/// The offset is `crop / 2` on both axes, so the output has shape
/// `[H − crop, W − crop, C]`. `crop = 0` returns the image unchanged.
pub fn center_crop(image: &Array3<f32>, crop: usize) -> Array3<f32> {
    let (h, w, _) = image.dim();
    let d = crop / 2;
    image
        .slice(s![d..h - crop + d, d..w - crop + d, ..])
        .to_owned()
}

/// Crop a randomly-sized, randomly-placed window and resize back to `target`.
///
/// A window size `d` is drawn uniformly from `windows`; with probability
/// one-half the window is centered (`dx = dy = d / 2`), otherwise the
/// offsets are drawn independently and uniformly from `[0, d]`. The
/// `(H − d) × (W − d)` crop is then bilinear-resized to `target`.
pub fn random_crop(
    image: &Array3<f32>,
    target: (usize, usize),
    windows: &[usize],
    rng: &mut Xorshift64,
) -> Array3<f32> {
    let (h, w, _) = image.dim();
    let d = windows[rng.next_usize_range(0, windows.len() - 1)];
    let x = w - d;
    let y = h - d;
    let (dx, dy) = if rng.next_usize_range(0, 1) == 1 {
        (d / 2, d / 2)
    } else {
        (rng.next_usize_range(0, d), rng.next_usize_range(0, d))
    };
    let cropped = image.slice(s![dy..y + dy, dx..x + dx, ..]).to_owned();
    resize_bilinear(&cropped, target.0, target.1)
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Rotate by a uniform integer angle in `[−max_deg, max_deg)` degrees and
/// resize to `target`.
///
/// Rotation is about the image centre with bilinear sampling; source
/// locations falling outside the image contribute zero.
pub fn random_rotate(
    image: &Array3<f32>,
    max_deg: i64,
    target: (usize, usize),
    rng: &mut Xorshift64,
) -> Array3<f32> {
    let degrees = rng.next_i64_range(-max_deg, max_deg);
    let rotated = rotate(image, degrees as f32);
    resize_bilinear(&rotated, target.0, target.1)
}

/// Rotate counter-clockwise by `degrees` about the image centre.
///
/// Output shape equals input shape; out-of-bounds source pixels read as 0.
pub fn rotate(image: &Array3<f32>, degrees: f32) -> Array3<f32> {
    let (h, w, c) = image.dim();
    let theta = degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let cy = (h as f32 - 1.0) / 2.0;
    let cx = (w as f32 - 1.0) / 2.0;

    Array3::from_shape_fn((h, w, c), |(r, col, ch)| {
        let dx = col as f32 - cx;
        let dy = r as f32 - cy;
        // Inverse mapping: rotate the destination offset back by -θ.
        let sx = cos_t * dx + sin_t * dy + cx;
        let sy = -sin_t * dx + cos_t * dy + cy;
        sample_bilinear(image, sy, sx, ch)
    })
}

// ---------------------------------------------------------------------------
// Resizing
// ---------------------------------------------------------------------------

/// Bilinear resize to `out_h × out_w`, preserving the channel count.
pub fn resize_bilinear(image: &Array3<f32>, out_h: usize, out_w: usize) -> Array3<f32> {
    let (h, w, c) = image.dim();
    if h == out_h && w == out_w {
        return image.clone();
    }
    let scale_r = axis_scale(h, out_h);
    let scale_c = axis_scale(w, out_w);
    Array3::from_shape_fn((out_h, out_w, c), |(r, col, ch)| {
        sample_bilinear(image, r as f32 * scale_r, col as f32 * scale_c, ch)
    })
}

/// Source-per-destination step along one axis (corner-aligned).
fn axis_scale(src: usize, dst: usize) -> f32 {
    if dst <= 1 {
        0.0
    } else {
        (src as f32 - 1.0) / (dst as f32 - 1.0)
    }
}

/// Bilinear sample at fractional `(row, col)`; zero outside the image.
fn sample_bilinear(image: &Array3<f32>, row: f32, col: f32, ch: usize) -> f32 {
    let (h, w, _) = image.dim();
    if row < -1.0 || col < -1.0 || row > h as f32 || col > w as f32 {
        return 0.0;
    }
    let r0 = row.floor();
    let c0 = col.floor();
    let fr = row - r0;
    let fc = col - c0;

    let at = |r: f32, c: f32| -> f32 {
        if r < 0.0 || c < 0.0 {
            return 0.0;
        }
        let (ri, ci) = (r as usize, c as usize);
        if ri >= h || ci >= w {
            0.0
        } else {
            image[[ri, ci, ch]]
        }
    };

    let top = at(r0, c0) * (1.0 - fc) + at(r0, c0 + 1.0) * fc;
    let bottom = at(r0 + 1.0, c0) * (1.0 - fc) + at(r0 + 1.0, c0 + 1.0) * fc;
    top * (1.0 - fr) + bottom * fr
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
