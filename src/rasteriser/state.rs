/// How textures are sampled when shading a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    Nearest,
    Bilinear,
    MipmapNearest,
    MipmapBilinear,
}

impl SampleMode {
    /// Cycles nearest -> bilinear -> mipmap nearest -> mipmap bilinear -> nearest.
    pub fn next(self) -> SampleMode {
        return match self {
            SampleMode::Nearest => SampleMode::Bilinear,
            SampleMode::Bilinear => SampleMode::MipmapNearest,
            SampleMode::MipmapNearest => SampleMode::MipmapBilinear,
            SampleMode::MipmapBilinear => SampleMode::Nearest,
        };
    }

    pub fn uses_mipmaps(self) -> bool {
        return matches!(self, SampleMode::MipmapNearest | SampleMode::MipmapBilinear);
    }
}

/// How a shaded fragment is combined with the colour already in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Replace,
    Alpha,
    Additive,
}

impl BlendMode {
    /// Cycles replace -> alpha -> additive -> replace.
    pub fn next(self) -> BlendMode {
        return match self {
            BlendMode::Replace => BlendMode::Alpha,
            BlendMode::Alpha => BlendMode::Additive,
            BlendMode::Additive => BlendMode::Replace,
        };
    }
}

/// Settings read by every draw call until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub sample_mode: SampleMode,
    pub blend_mode: BlendMode,
    /// Clip lines against the view volume before stepping them.
    pub clip_lines: bool,
    /// Clip triangles that cross the view volume before scanning them.
    pub clip_triangles: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        return RasterState {
            sample_mode: SampleMode::Nearest,
            blend_mode: BlendMode::Replace,
            clip_lines: true,
            clip_triangles: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_mode_cycles_back() {
        let mut mode = SampleMode::Nearest;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, SampleMode::Nearest);
        assert_eq!(
            seen,
            vec![
                SampleMode::Nearest,
                SampleMode::Bilinear,
                SampleMode::MipmapNearest,
                SampleMode::MipmapBilinear
            ]
        );
    }

    #[test]
    fn blend_mode_cycles_back() {
        assert_eq!(BlendMode::Replace.next(), BlendMode::Alpha);
        assert_eq!(BlendMode::Alpha.next(), BlendMode::Additive);
        assert_eq!(BlendMode::Additive.next(), BlendMode::Replace);
    }
}
