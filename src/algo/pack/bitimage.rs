//! One-bit-per-texel occupancy images.
//!
//! Rows are stored as `u64` words so overlap tests and commits work 64
//! texels at a time, at arbitrary bit offsets.

/// A binary image with `u64` word rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitImage {
    width: u32,
    height: u32,
    words_per_row: usize,
    data: Vec<u64>,
}

impl BitImage {
    /// Create an empty image.
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            words_per_row,
            data: vec![0; words_per_row * height as usize],
        }
    }

    /// Image width in texels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in texels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn row(&self, y: u32) -> &[u64] {
        let start = y as usize * self.words_per_row;
        &self.data[start..start + self.words_per_row]
    }

    /// Read one texel.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let word = self.data[y as usize * self.words_per_row + (x / 64) as usize];
        word >> (x % 64) & 1 != 0
    }

    /// Set one texel.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32) {
        debug_assert!(x < self.width && y < self.height);
        self.data[y as usize * self.words_per_row + (x / 64) as usize] |= 1u64 << (x % 64);
    }

    /// Number of set texels.
    pub fn count_ones(&self) -> u64 {
        self.data.iter().map(|w| w.count_ones() as u64).sum()
    }

    /// Check if no texel is set.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Grow to at least `height` rows, keeping the content.
    pub fn grow_height(&mut self, height: u32) {
        if height > self.height {
            self.height = height;
            self.data.resize(self.words_per_row * height as usize, 0);
        }
    }

    /// The image rotated 90 degrees counter-clockwise: texel `(x, y)` moves
    /// to `(height - 1 - y, x)`.
    pub fn rotated(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    out.set(self.height - 1 - y, x);
                }
            }
        }
        out
    }

    /// Square (Chebyshev) dilation by `radius` texels, clipped to the image.
    pub fn dilated(&self, radius: u32) -> Self {
        if radius == 0 {
            return self.clone();
        }

        // Horizontal pass, one word-shift per step.
        let mut horizontal = self.clone();
        for y in 0..self.height {
            let src = self.row(y).to_vec();
            let start = y as usize * self.words_per_row;
            let dst = &mut horizontal.data[start..start + self.words_per_row];
            for shift in 1..=radius {
                or_shifted_left(dst, &src, shift);
                or_shifted_right(dst, &src, shift);
            }
        }
        horizontal.clear_padding_bits();

        // Vertical pass.
        let mut out = horizontal.clone();
        for y in 0..self.height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(self.height - 1);
            for sy in lo..=hi {
                if sy == y {
                    continue;
                }
                let src_start = sy as usize * self.words_per_row;
                let dst_start = y as usize * self.words_per_row;
                for w in 0..self.words_per_row {
                    out.data[dst_start + w] |= horizontal.data[src_start + w];
                }
            }
        }
        out
    }

    /// Check whether `other`, placed with its origin at `(x, y)`, overlaps any
    /// set texel. Rows of `other` below this image's last row count as free;
    /// the caller keeps `x + other.width() <= self.width()`.
    pub fn overlaps(&self, other: &BitImage, x: u32, y: u32) -> bool {
        debug_assert!(x + other.width <= self.width);
        for oy in 0..other.height {
            let ty = y + oy;
            if ty >= self.height {
                break;
            }
            let row = self.row(ty);
            for (k, &word) in other.row(oy).iter().enumerate() {
                if word != 0 && extract_bits(row, x as usize + k * 64) & word != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Set every texel that is set in `other` placed at `(x, y)`. Grows the
    /// height if needed.
    pub fn blit(&mut self, other: &BitImage, x: u32, y: u32) {
        debug_assert!(x + other.width <= self.width);
        self.grow_height(y + other.height);
        for oy in 0..other.height {
            let start = (y + oy) as usize * self.words_per_row;
            let words_per_row = self.words_per_row;
            let row = &mut self.data[start..start + words_per_row];
            for (k, &word) in other.row(oy).iter().enumerate() {
                if word != 0 {
                    insert_bits(row, x as usize + k * 64, word);
                }
            }
        }
    }

    fn clear_padding_bits(&mut self) {
        let used = self.width % 64;
        if used == 0 || self.words_per_row == 0 {
            return;
        }
        let mask = (1u64 << used) - 1;
        for y in 0..self.height as usize {
            self.data[y * self.words_per_row + self.words_per_row - 1] &= mask;
        }
    }
}

/// 64 bits of `row` starting at bit `offset`; bits past the end read as zero.
#[inline]
fn extract_bits(row: &[u64], offset: usize) -> u64 {
    let (index, shift) = (offset / 64, offset % 64);
    let lo = row.get(index).copied().unwrap_or(0);
    if shift == 0 {
        return lo;
    }
    let hi = row.get(index + 1).copied().unwrap_or(0);
    (lo >> shift) | (hi << (64 - shift))
}

#[inline]
fn insert_bits(row: &mut [u64], offset: usize, bits: u64) {
    let (index, shift) = (offset / 64, offset % 64);
    if let Some(w) = row.get_mut(index) {
        *w |= bits << shift;
    }
    if shift != 0 {
        if let Some(w) = row.get_mut(index + 1) {
            *w |= bits >> (64 - shift);
        }
    }
}

/// `dst |= src` shifted towards higher x by `shift` bits.
fn or_shifted_left(dst: &mut [u64], src: &[u64], shift: u32) {
    let (words, bits) = ((shift / 64) as usize, shift % 64);
    for i in (0..dst.len()).rev() {
        let Some(j) = i.checked_sub(words) else { continue };
        let mut v = src[j] << bits;
        if bits != 0 && j > 0 {
            v |= src[j - 1] >> (64 - bits);
        }
        dst[i] |= v;
    }
}

/// `dst |= src` shifted towards lower x by `shift` bits.
fn or_shifted_right(dst: &mut [u64], src: &[u64], shift: u32) {
    let (words, bits) = ((shift / 64) as usize, shift % 64);
    for i in 0..dst.len() {
        let j = i + words;
        if j >= src.len() {
            break;
        }
        let mut v = src[j] >> bits;
        if bits != 0 && j + 1 < src.len() {
            v |= src[j + 1] << (64 - bits);
        }
        dst[i] |= v;
    }
}
