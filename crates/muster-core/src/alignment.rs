//! Face alignment via 4-DOF similarity transform.
//!
//! Maps the five detected facial landmarks onto the canonical InsightFace
//! reference positions and warps the face region into a 112×112 RGB crop
//! for embedding extraction.

/// ArcFace reference landmarks for a 112×112 output.
const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub const ALIGNED_SIZE: usize = 112;
const RGB_CHANNELS: usize = 3;

/// 4-DOF similarity transform (scale+rotation as (a, b), translation (tx, ty)):
///
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
#[derive(Debug, Clone, Copy)]
struct Similarity {
    a: f32,
    b: f32,
    tx: f32,
    ty: f32,
}

impl Similarity {
    const IDENTITY: Similarity = Similarity { a: 1.0, b: 0.0, tx: 0.0, ty: 0.0 };

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        )
    }
}

/// Least-squares estimate of the similarity transform from `src` to `dst`.
///
/// Each point pair contributes two rows of the overdetermined system
/// `A·[a, b, tx, ty]ᵀ = B`; the 4×4 normal equations are solved by
/// Gaussian elimination with partial pivoting.
fn estimate_similarity(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> Similarity {
    let mut ata = [[0.0f32; 4]; 4];
    let mut atb = [0.0f32; 4];

    for i in 0..5 {
        let (sx, sy) = src[i];
        let (dx, dy) = dst[i];

        // sx·a - sy·b + tx = dx
        // sy·a + sx·b + ty = dy
        let rows = [([sx, -sy, 1.0, 0.0], dx), ([sy, sx, 0.0, 1.0], dy)];

        for (row, rhs) in rows {
            for j in 0..4 {
                for k in 0..4 {
                    ata[j][k] += row[j] * row[k];
                }
                atb[j] += row[j] * rhs;
            }
        }
    }

    // Augmented [A | b], forward elimination with partial pivoting.
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        m[i][..4].copy_from_slice(&ata[i]);
        m[i][4] = atb[i];
    }

    for col in 0..4 {
        let mut pivot_row = col;
        for row in (col + 1)..4 {
            if m[row][col].abs() > m[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            // Degenerate landmark geometry; skip alignment rather than warp garbage.
            return Similarity::IDENTITY;
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }

    Similarity { a: x[0], b: x[1], tx: x[2], ty: x[3] }
}

/// Inverse-warp an RGB24 frame through a similarity transform into a
/// square output crop. Bilinear sampling, out-of-bounds filled black.
fn warp_rgb(rgb: &[u8], width: usize, height: usize, t: &Similarity, out_size: usize) -> Vec<u8> {
    let det = t.a * t.a + t.b * t.b;
    if det.abs() < 1e-12 {
        return vec![0u8; out_size * out_size * RGB_CHANNELS];
    }
    let ia = t.a / det;
    let ib = t.b / det;

    let sample = |x: i32, y: i32, c: usize| -> f32 {
        if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
            rgb[(y as usize * width + x as usize) * RGB_CHANNELS + c] as f32
        } else {
            0.0
        }
    };

    let mut output = vec![0u8; out_size * out_size * RGB_CHANNELS];

    for oy in 0..out_size {
        for ox in 0..out_size {
            // src = M⁻¹ · (dst - translation)
            let dx = ox as f32 - t.tx;
            let dy = oy as f32 - t.ty;
            let sx = ia * dx + ib * dy;
            let sy = -ib * dx + ia * dy;

            let x0 = sx.floor() as i32;
            let y0 = sy.floor() as i32;
            let fx = sx - x0 as f32;
            let fy = sy - y0 as f32;

            for c in 0..RGB_CHANNELS {
                let val = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, c) * fx * fy;
                output[(oy * out_size + ox) * RGB_CHANNELS + c] =
                    val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    output
}

/// Align a detected face to a canonical 112×112 RGB crop.
pub fn align_face(
    rgb: &[u8],
    width: u32,
    height: u32,
    landmarks: &[(f32, f32); 5],
) -> Vec<u8> {
    let t = estimate_similarity(landmarks, &REFERENCE_LANDMARKS_112);
    warp_rgb(rgb, width as usize, height as usize, &t, ALIGNED_SIZE)
}
