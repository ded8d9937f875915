use ndarray::{s, ArrayView3, ArrayViewMut3};

use crate::shared::region::Region;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// An all-black frame with the same geometry as `like`.
    pub fn black_like(like: &Frame) -> Self {
        let len = like.data.len();
        Self::new(vec![0; len], like.width, like.height, like.channels, like.index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn same_geometry(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `region` from `src` into the same
    /// coordinates of this frame.
    ///
    /// The region is clamped to the frame; degenerate regions copy nothing.
    /// Returns the clamped region that was copied.
    pub fn copy_region_from(&mut self, src: &Frame, region: &Region) -> Option<Region> {
        debug_assert!(self.same_geometry(src), "frames must share geometry");
        let clamped = region.clamp(self.width, self.height)?;
        let (x1, y1, x2, y2) = clamped.bounds_usize();
        let source = src.as_ndarray();
        let patch = source.slice(s![y1..y2, x1..x2, ..]);
        self.as_ndarray_mut()
            .slice_mut(s![y1..y2, x1..x2, ..])
            .assign(&patch);
        Some(clamped)
    }

    /// Zeroes the pixels inside `region`.
    pub fn clear_region(&mut self, region: &Region) {
        if let Some(clamped) = region.clamp(self.width, self.height) {
            let (x1, y1, x2, y2) = clamped.bounds_usize();
            self.as_ndarray_mut()
                .slice_mut(s![y1..y2, x1..x2, ..])
                .fill(0);
        }
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
