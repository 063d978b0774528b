//! Pointer-drag resizing for the inspector drawer.
//!
//! ARCHITECTURE
//! ============
//! A drag claims global pointer listeners and the resize cursor from the
//! host surface for its whole duration. Both are held by a `DragSession`
//! that is released exactly once: on pointer-up, when a new drag starts, or
//! when the resizer is dropped mid-drag.

#[cfg(test)]
#[path = "resize_test.rs"]
mod tests;

/// Cursor shown on the host surface while dragging.
pub const RESIZE_CURSOR: &str = "ew-resize";

/// Handle for one registration of global pointer listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CaptureToken(pub u64);

/// The global surface pointer events and cursor styles live on
/// (the window/body in a browser, the terminal in a TUI).
pub trait PointerSurface {
    /// Cursor currently set on the surface, `None` for the default.
    fn cursor(&self) -> Option<String>;

    fn set_cursor(&mut self, cursor: Option<&str>);

    /// Route pointer-move and pointer-up events to the resizer regardless of
    /// where the pointer is.
    fn capture_global(&mut self) -> CaptureToken;

    fn release_global(&mut self, token: CaptureToken);
}

/// Surface for headless hosts: tracks the cursor but has no listeners.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    cursor: Option<String>,
    next_token: u64,
}

impl PointerSurface for HeadlessSurface {
    fn cursor(&self) -> Option<String> {
        self.cursor.clone()
    }

    fn set_cursor(&mut self, cursor: Option<&str>) {
        self.cursor = cursor.map(str::to_owned);
    }

    fn capture_global(&mut self) -> CaptureToken {
        self.next_token += 1;
        CaptureToken(self.next_token)
    }

    fn release_global(&mut self, _token: CaptureToken) {}
}

/// `max(lo, min(hi, value))`. Requires `lo <= hi`.
#[must_use]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    debug_assert!(lo <= hi, "clamp bounds inverted: {lo} > {hi}");
    lo.max(hi.min(value))
}

/// Inclusive size limits for the drawer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeBounds {
    pub min: f64,
    pub max: f64,
}

impl ResizeBounds {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "resize bounds inverted: {min} > {max}");
        Self { min, max }
    }

    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        clamp(value, self.min, self.max)
    }
}

#[derive(Debug)]
struct DragSession {
    /// Pointer x at which the drawer would have zero width.
    anchor: f64,
    token: CaptureToken,
    previous_cursor: Option<String>,
}

/// Turns drags on the drawer's edge handle into clamped widths.
pub struct DrawerResizer {
    surface: Box<dyn PointerSurface + Send>,
    bounds: ResizeBounds,
    session: Option<DragSession>,
}

impl DrawerResizer {
    #[must_use]
    pub fn new(surface: Box<dyn PointerSurface + Send>, bounds: ResizeBounds) -> Self {
        Self { surface, bounds, session: None }
    }

    #[must_use]
    pub fn bounds(&self) -> ResizeBounds {
        self.bounds
    }

    /// Replace the limits. Applies to the drag in progress as well.
    pub fn set_bounds(&mut self, bounds: ResizeBounds) {
        self.bounds = bounds;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Pointer-down on the handle at `start_x` while the drawer is
    /// `current_size` wide.
    pub fn begin(&mut self, start_x: f64, current_size: f64) {
        self.release();
        let previous_cursor = self.surface.cursor();
        let token = self.surface.capture_global();
        self.surface.set_cursor(Some(RESIZE_CURSOR));
        self.session = Some(DragSession { anchor: start_x + current_size, token, previous_cursor });
    }

    /// Global pointer-move. Returns the new size while dragging.
    pub fn pointer_move(&mut self, x: f64) -> Option<f64> {
        let session = self.session.as_ref()?;
        Some(self.bounds.clamp(session.anchor - x))
    }

    /// Global pointer-up. Returns true when a drag ended.
    pub fn pointer_up(&mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.surface.release_global(session.token);
        self.surface.set_cursor(session.previous_cursor.as_deref());
        true
    }
}

impl Drop for DrawerResizer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DrawerResizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawerResizer")
            .field("bounds", &self.bounds)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
