//! Frame type and pixel conversions — YUYV decoding and downscaling.

/// A captured RGB24 camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Interleaved RGB pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    /// Average pixel brightness across all channels (0.0–255.0).
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Produce a copy downscaled by an integer factor using box averaging.
    ///
    /// A factor of 0 or 1, or a frame smaller than one block, returns an
    /// unscaled clone.
    pub fn downscaled(&self, factor: u32) -> Frame {
        if factor <= 1 || self.width < factor || self.height < factor {
            return self.clone();
        }

        let f = factor as usize;
        let src_w = self.width as usize;
        let out_w = src_w / f;
        let out_h = self.height as usize / f;
        let block = (f * f) as u32;

        let mut data = vec![0u8; out_w * out_h * 3];

        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut sums = [0u32; 3];
                for dy in 0..f {
                    for dx in 0..f {
                        let src = ((oy * f + dy) * src_w + ox * f + dx) * 3;
                        sums[0] += self.data[src] as u32;
                        sums[1] += self.data[src + 1] as u32;
                        sums[2] += self.data[src + 2] as u32;
                    }
                }
                let dst = (oy * out_w + ox) * 3;
                for c in 0..3 {
                    data[dst + c] = (sums[c] / block) as u8;
                }
            }
        }

        Frame {
            data,
            width: out_w as u32,
            height: out_h as u32,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Convert packed YUYV (4:2:2) to interleaved RGB24 using BT.601.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; U and V are shared
/// by the pixel pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);

    for quad in yuyv[..expected].chunks_exact(4) {
        let u = quad[1] as i32 - 128;
        let v = quad[3] as i32 - 128;
        for &y in &[quad[0], quad[2]] {
            let c = 298 * (y as i32 - 16);
            rgb.push(clamp_u8((c + 409 * v + 128) >> 8));
            rgb.push(clamp_u8((c - 100 * u - 208 * v + 128) >> 8));
            rgb.push(clamp_u8((c + 516 * u + 128) >> 8));
        }
    }

    Ok(rgb)
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame {
            data,
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    #[test]
    fn test_yuyv_black() {
        // Y=16, U=V=128 is reference black.
        let rgb = yuyv_to_rgb(&[16, 128, 16, 128], 2, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_yuyv_white() {
        // Y=235, U=V=128 is reference white.
        let rgb = yuyv_to_rgb(&[235, 128, 235, 128], 2, 1).unwrap();
        assert_eq!(rgb, vec![255, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_neutral_chroma_is_gray() {
        let rgb = yuyv_to_rgb(&[128, 128, 128, 128], 2, 1).unwrap();
        // Both pixels gray: R == G == B.
        assert_eq!(rgb[0], rgb[1]);
        assert_eq!(rgb[1], rgb[2]);
        assert_eq!(&rgb[0..3], &rgb[3..6]);
    }

    #[test]
    fn test_yuyv_pixel_pair_shares_chroma() {
        // Different lumas in one quad give two distinct pixels.
        let rgb = yuyv_to_rgb(&[50, 128, 200, 128], 2, 1).unwrap();
        assert!(rgb[0] < rgb[3]);
    }

    #[test]
    fn test_yuyv_invalid_length() {
        assert!(yuyv_to_rgb(&[100, 128], 2, 1).is_err());
    }

    #[test]
    fn test_downscale_dimensions() {
        let f = frame(vec![0u8; 64 * 48 * 3], 64, 48);
        let small = f.downscaled(4);
        assert_eq!(small.width, 16);
        assert_eq!(small.height, 12);
        assert_eq!(small.data.len(), 16 * 12 * 3);
    }

    #[test]
    fn test_downscale_averages_blocks() {
        // 2x2 frame, one white pixel among three black: average 63.
        let mut data = vec![0u8; 2 * 2 * 3];
        data[0] = 255;
        data[1] = 255;
        data[2] = 255;
        let small = frame(data, 2, 2).downscaled(2);
        assert_eq!(small.width, 1);
        assert_eq!(small.data, vec![63, 63, 63]);
    }

    #[test]
    fn test_downscale_factor_one_is_identity() {
        let f = frame(vec![7u8; 4 * 4 * 3], 4, 4);
        let same = f.downscaled(1);
        assert_eq!(same.width, 4);
        assert_eq!(same.data, f.data);
    }

    #[test]
    fn test_downscale_tiny_frame_unchanged() {
        let f = frame(vec![9u8; 2 * 2 * 3], 2, 2);
        let same = f.downscaled(4);
        assert_eq!(same.width, 2);
    }

    #[test]
    fn test_avg_brightness() {
        let f = frame(vec![100u8; 4 * 4 * 3], 4, 4);
        assert!((f.avg_brightness() - 100.0).abs() < 1e-6);
        assert_eq!(frame(vec![], 0, 0).avg_brightness(), 0.0);
    }
}
