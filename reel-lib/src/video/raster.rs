/// Off-screen pixel buffer in packed `0x00RRGGBB` format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    stamp: Option<u64>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            stamp: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Index of the frame whose data this raster currently holds.
    pub fn stamp(&self) -> Option<u64> {
        self.stamp
    }

    pub fn set_stamp(&mut self, stamp: u64) {
        self.stamp = Some(stamp);
    }

    pub fn fill(&mut self, pixel: u32) {
        self.pixels.iter_mut().for_each(|p| *p = pixel);
    }
}

/// Pack 8-bit channels into a raster pixel.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Split a raster pixel into 8-bit channels.
pub fn unpack_rgb(pixel: u32) -> (u8, u8, u8) {
    ((pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_lookup_is_row_major() {
        let mut raster = Raster::new(3, 2);
        raster.pixels_mut()[4] = 7;
        assert_eq!(raster.pixel(1, 1), Some(7));
        assert_eq!(raster.pixel(3, 0), None);
    }

    #[test]
    fn pack_and_unpack_agree() {
        let pixel = pack_rgb(0x12, 0x34, 0x56);
        assert_eq!(pixel, 0x0012_3456);
        assert_eq!(unpack_rgb(pixel), (0x12, 0x34, 0x56));
    }
}
