/// Read-only access to a row-major image with interleaved channels.
///
/// `row(y)` returns exactly `width() * CHANNELS` samples; `stride()` counts
/// samples between the starts of consecutive rows.
pub trait ImageView {
    type Sample: Copy;
    const CHANNELS: usize;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Sample];

    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    fn is_contiguous(&self) -> bool {
        self.stride() == self.width() * Self::CHANNELS
    }
}

pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Sample];
}
