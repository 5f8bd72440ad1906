//! Common interface for anything whose pixel dimensions follow the window.

/// A render target sized in physical pixels.
///
/// Implemented by the surface owner and the effect composer so a single
/// resize handler can keep every output in step with the viewport.
pub trait Resizable {
    /// Resize to the given physical dimensions.
    fn set_size(&mut self, width: u32, height: u32);

    /// Current physical dimensions.
    fn size(&self) -> (u32, u32);
}
