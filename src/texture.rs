use std::path::Path;

use anyhow::Context;
use image::RgbaImage;
use log::debug;
use nalgebra as na;
use na::Vector2;

use crate::colour::Colour;

/// One level of the mip chain, row-major with row 0 at v = 0.
#[derive(Debug, Clone)]
pub struct TextureLevel {
    pub width: usize,
    pub height: usize,
    texels: Vec<Colour>,
}

impl TextureLevel {
    /// Texel with repeat addressing.
    fn texel(&self, x: i64, y: i64) -> Colour {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        return self.texels[y * self.width + x];
    }

    /// Next level down: half size, each texel the average of a 2x2 block.
    fn downsample(&self) -> TextureLevel {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut texels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let mut sum = [0u32; 4];
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    // Clamping covers odd sizes, where the last column/row has no partner.
                    let sx = (2 * x + dx).min(self.width - 1);
                    let sy = (2 * y + dy).min(self.height - 1);
                    let c = self.texels[sy * self.width + sx];
                    sum[0] += c.r as u32;
                    sum[1] += c.g as u32;
                    sum[2] += c.b as u32;
                    sum[3] += c.a as u32;
                }
                texels.push(Colour::new(
                    ((sum[0] + 2) / 4) as u8,
                    ((sum[1] + 2) / 4) as u8,
                    ((sum[2] + 2) / 4) as u8,
                    ((sum[3] + 2) / 4) as u8,
                ));
            }
        }
        return TextureLevel { width, height, texels };
    }
}

/// Image with a full mip chain, sampled with wrapping UVs.
#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<TextureLevel>,
}

impl Texture {
    /// Builds a texture from raw texels. Empty input gives a 1x1 white texture.
    pub fn from_texels(width: usize, height: usize, texels: Vec<Colour>) -> Texture {
        let base = if width == 0 || height == 0 || texels.len() != width * height {
            TextureLevel { width: 1, height: 1, texels: vec![Colour::WHITE] }
        } else {
            TextureLevel { width, height, texels }
        };

        let mut levels = vec![base];
        loop {
            let last = &levels[levels.len() - 1];
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        return Texture { levels };
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Texture {
        let texels = image.pixels().map(|p| Colour::new(p[0], p[1], p[2], p[3])).collect();
        return Texture::from_texels(image.width() as usize, image.height() as usize, texels);
    }

    /// Decodes any image format the `image` crate understands.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Texture> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("loading texture {}", path.display()))?
            .to_rgba8();
        let texture = Texture::from_rgba_image(&image);
        debug!(
            "Loaded texture {} ({}x{}, {} mip levels)",
            path.display(),
            texture.width(),
            texture.height(),
            texture.mip_level_count()
        );
        return Ok(texture);
    }

    /// Square checkerboard of `size` texels with cells `cell` texels wide.
    pub fn checkerboard(size: usize, cell: usize, a: Colour, b: Colour) -> Texture {
        let cell = cell.max(1);
        let mut texels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                texels.push(if (x / cell + y / cell) % 2 == 0 { a } else { b });
            }
        }
        return Texture::from_texels(size, size, texels);
    }

    pub fn width(&self) -> usize {
        return self.levels[0].width;
    }

    pub fn height(&self) -> usize {
        return self.levels[0].height;
    }

    pub fn mip_level_count(&self) -> usize {
        return self.levels.len();
    }

    fn level(&self, level: usize) -> &TextureLevel {
        return &self.levels[level.min(self.levels.len() - 1)];
    }

    /// Closest texel to `uv` at the given mip level.
    pub fn nearest_sample(&self, uv: Vector2<f32>, level: usize) -> Colour {
        let level = self.level(level);
        let x = (uv.x * level.width as f32).floor();
        let y = (uv.y * level.height as f32).floor();
        if !x.is_finite() || !y.is_finite() {
            return level.texels[0];
        }
        return level.texel(x as i64, y as i64);
    }

    /// Weighted average of the four texels around `uv` at the given mip level.
    pub fn bilinear_sample(&self, uv: Vector2<f32>, level: usize) -> Colour {
        let level = self.level(level);
        // Texel centres sit at half-integer positions.
        let x = uv.x * level.width as f32 - 0.5;
        let y = uv.y * level.height as f32 - 0.5;
        if !x.is_finite() || !y.is_finite() {
            return level.texels[0];
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = Colour::lerp(level.texel(x0, y0), level.texel(x0 + 1, y0), fx);
        let bottom = Colour::lerp(level.texel(x0, y0 + 1), level.texel(x0 + 1, y0 + 1), fx);
        return Colour::lerp(top, bottom, fy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::vector;

    #[test]
    fn mip_chain_goes_down_to_one_texel() {
        let texture = Texture::checkerboard(8, 1, Colour::WHITE, Colour::BLACK);
        assert_eq!(texture.mip_level_count(), 4);
        // A 1-texel checkerboard averages to mid grey.
        let c = texture.nearest_sample(vector![0.5, 0.5], 3);
        assert!(c.r > 120 && c.r < 135);
        // Levels past the end clamp to the last one.
        assert_eq!(texture.nearest_sample(vector![0.5, 0.5], 10), c);
    }

    #[test]
    fn nearest_wraps() {
        let texels = vec![Colour::RED, Colour::GREEN, Colour::BLUE, Colour::WHITE];
        let texture = Texture::from_texels(2, 2, texels);
        assert_eq!(texture.nearest_sample(vector![0.25, 0.25], 0), Colour::RED);
        assert_eq!(texture.nearest_sample(vector![0.75, 0.25], 0), Colour::GREEN);
        assert_eq!(texture.nearest_sample(vector![0.25, 0.75], 0), Colour::BLUE);
        assert_eq!(texture.nearest_sample(vector![1.25, -0.25], 0), Colour::BLUE);
    }

    #[test]
    fn bilinear_blends_neighbours() {
        let texture = Texture::from_texels(2, 1, vec![Colour::BLACK, Colour::WHITE]);
        // Exactly on a texel centre.
        assert_eq!(texture.bilinear_sample(vector![0.25, 0.5], 0), Colour::BLACK);
        // Half way between the two centres.
        let mid = texture.bilinear_sample(vector![0.5, 0.5], 0);
        assert_eq!(mid.r, 128);
    }

    #[test]
    fn invalid_texels_fall_back_to_white() {
        let texture = Texture::from_texels(3, 3, vec![Colour::RED]);
        assert_eq!(texture.width(), 1);
        assert_eq!(texture.nearest_sample(vector![0.3, 0.3], 0), Colour::WHITE);
    }
}
