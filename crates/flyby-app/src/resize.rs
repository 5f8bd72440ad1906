//! Keeps the camera projection and every render target in step with the
//! window size.

use flyby_render::{PerspectiveCamera, Resizable, Viewport};

/// Apply new physical window dimensions.
///
/// Zero dimensions clamp to 1. Returns whether the viewport changed;
/// targets are resized regardless so a lost surface is reconfigured.
pub fn handle_resize(
    camera: &mut PerspectiveCamera,
    viewport: &mut Viewport,
    targets: &mut [&mut dyn Resizable],
    width: u32,
    height: u32,
) -> bool {
    let changed = viewport.resize(width, height);
    let (width, height) = (viewport.width(), viewport.height());

    camera.set_aspect_ratio(width as f32, height as f32);
    for target in targets.iter_mut() {
        target.set_size(width, height);
    }

    if changed {
        tracing::debug!("Resized to {width}x{height}");
    }
    changed
}
