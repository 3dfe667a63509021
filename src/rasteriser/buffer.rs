use crate::colour::Colour;

use super::state::BlendMode;

/// Largest value a depth cell can hold; also what `clear` resets depth to.
pub const DEPTH_MAX: u16 = u16::MAX;

/// Two colour buffers drawn into in turn, plus a shared depth buffer.
/// (0, 0) is the bottom left pixel, rows are stored bottom to top.
pub struct FrameBuffers {
    pub width: u32,
    pub height: u32,
    colour_buffers: [Vec<Colour>; 2],
    // Lower is nearer.
    depth_buffer: Vec<u16>,
    current_draw_buffer: usize,
}

impl FrameBuffers {
    pub fn new(width: u32, height: u32) -> FrameBuffers {
        let n_pixels = (width as usize) * (height as usize);
        return FrameBuffers {
            width,
            height,
            colour_buffers: [vec![Colour::BLACK; n_pixels], vec![Colour::BLACK; n_pixels]],
            depth_buffer: vec![DEPTH_MAX; n_pixels],
            current_draw_buffer: 0,
        };
    }

    /// Throws away all three buffers and allocates new ones of the given size.
    /// The buffer being drawn into stays the same.
    pub fn resize(&mut self, width: u32, height: u32) {
        let current_draw_buffer = self.current_draw_buffer;
        *self = FrameBuffers::new(width, height);
        self.current_draw_buffer = current_draw_buffer;
    }

    pub fn current_draw_buffer(&self) -> usize {
        return self.current_draw_buffer;
    }

    /// Buffer currently drawn into.
    pub fn current(&self) -> &[Colour] {
        return &self.colour_buffers[self.current_draw_buffer][..];
    }

    pub fn depth(&self) -> &[u16] {
        return &self.depth_buffer[..];
    }

    /// Sets every pixel of the current buffer to opaque black and every depth cell to the far
    /// value.
    pub fn clear(&mut self) {
        self.colour_buffers[self.current_draw_buffer].fill(Colour::BLACK);
        self.depth_buffer.fill(DEPTH_MAX);
    }

    /// Flips which of the two buffers gets drawn into.
    pub fn swap(&mut self) {
        self.current_draw_buffer ^= 1;
    }

    /// Index into the flat buffers, `None` outside of the frame.
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        return Some(y as usize * self.width as usize + x as usize);
    }

    /// Depth test and write. `depth` is in viewport depth units, [0, DEPTH_MAX].
    /// Passes when the quantized value is not further than the stored one, in which case the
    /// stored value is replaced. Out of frame, out of range and NaN depths fail.
    pub fn depth_func(&mut self, x: i32, y: i32, depth: f32) -> bool {
        let index = match self.index(x, y) {
            Some(index) => index,
            None => return false,
        };
        if !(depth >= 0.0 && depth <= DEPTH_MAX as f32) {
            return false;
        }
        let quantized = depth as u16;
        if quantized > self.depth_buffer[index] {
            return false;
        }
        self.depth_buffer[index] = quantized;
        return true;
    }

    /// Overwrites a pixel of the current buffer. Out of frame writes are dropped.
    pub fn shade_pixel(&mut self, x: i32, y: i32, colour: Colour) {
        if let Some(index) = self.index(x, y) {
            self.colour_buffers[self.current_draw_buffer][index] = colour;
        }
    }

    /// Combines `colour` with the pixel of the current buffer according to `mode`.
    /// Out of frame writes are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, colour: Colour, mode: BlendMode) {
        let index = match self.index(x, y) {
            Some(index) => index,
            None => return,
        };
        let dest = &mut self.colour_buffers[self.current_draw_buffer][index];
        *dest = match mode {
            BlendMode::Replace => colour,
            BlendMode::Alpha => {
                let s_factor = colour.a as u32;
                let d_factor = 255 - colour.a as u32;
                let mix = |s: u8, d: u8| ((s as u32 * s_factor + d as u32 * d_factor) / 255) as u8;
                Colour {
                    r: mix(colour.r, dest.r),
                    g: mix(colour.g, dest.g),
                    b: mix(colour.b, dest.b),
                    a: mix(colour.a, dest.a),
                }
            }
            BlendMode::Additive => *dest + colour,
        };
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Colour> {
        return self.index(x, y).map(|index| self.colour_buffers[self.current_draw_buffer][index]);
    }

    pub fn depth_at(&self, x: i32, y: i32) -> Option<u16> {
        return self.index(x, y).map(|index| self.depth_buffer[index]);
    }
}
