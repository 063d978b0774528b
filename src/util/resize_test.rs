#![allow(clippy::float_cmp)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::*;

// =============================================================
// Helpers
// =============================================================

#[derive(Default)]
struct SurfaceLog {
    cursor: Option<String>,
    active: HashSet<u64>,
    captures: u64,
    releases: u64,
    bad_releases: u64,
}

#[derive(Clone, Default)]
struct RecordingSurface(Arc<Mutex<SurfaceLog>>);

impl RecordingSurface {
    fn with_cursor(cursor: &str) -> Self {
        let surface = Self::default();
        surface.0.lock().unwrap().cursor = Some(cursor.to_owned());
        surface
    }

    fn log(&self) -> std::sync::MutexGuard<'_, SurfaceLog> {
        self.0.lock().unwrap()
    }
}

impl PointerSurface for RecordingSurface {
    fn cursor(&self) -> Option<String> {
        self.log().cursor.clone()
    }

    fn set_cursor(&mut self, cursor: Option<&str>) {
        self.log().cursor = cursor.map(str::to_owned);
    }

    fn capture_global(&mut self) -> CaptureToken {
        let mut log = self.log();
        log.captures += 1;
        let id = log.captures;
        log.active.insert(id);
        CaptureToken(id)
    }

    fn release_global(&mut self, token: CaptureToken) {
        let mut log = self.log();
        log.releases += 1;
        if !log.active.remove(&token.0) {
            log.bad_releases += 1;
        }
    }
}

fn resizer(surface: &RecordingSurface) -> DrawerResizer {
    DrawerResizer::new(Box::new(surface.clone()), ResizeBounds::new(500.0, 1500.0))
}

// =============================================================
// clamp
// =============================================================

#[test]
fn clamp_limits_to_bounds() {
    assert_eq!(clamp(200.0, 500.0, 1500.0), 500.0);
    assert_eq!(clamp(2000.0, 500.0, 1500.0), 1500.0);
    assert_eq!(clamp(900.0, 500.0, 1500.0), 900.0);
    assert_eq!(clamp(500.0, 500.0, 500.0), 500.0);
}

#[test]
#[should_panic(expected = "clamp bounds inverted")]
#[cfg(debug_assertions)]
fn clamp_asserts_ordered_bounds() {
    let _ = clamp(1.0, 10.0, 5.0);
}

// =============================================================
// Drag lifecycle
// =============================================================

#[test]
fn move_without_drag_yields_nothing() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    assert_eq!(resizer.pointer_move(100.0), None);
    assert!(!resizer.pointer_up());
    assert_eq!(surface.log().captures, 0);
}

#[test]
fn drag_computes_size_from_anchor() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    // Viewport 1920 wide, drawer 650 wide: handle sits at 1270.
    resizer.begin(1270.0, 650.0);
    assert!(resizer.is_dragging());
    assert_eq!(resizer.pointer_move(1270.0), Some(650.0));
    assert_eq!(resizer.pointer_move(1020.0), Some(900.0));
    assert_eq!(resizer.pointer_move(1800.0), Some(500.0));
    assert_eq!(resizer.pointer_move(0.0), Some(1500.0));
}

#[test]
fn drag_never_leaves_bounds() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    resizer.begin(1000.0, 700.0);
    let mut x = -3000.0;
    while x < 5000.0 {
        let size = resizer.pointer_move(x).expect("dragging");
        assert!((500.0..=1500.0).contains(&size), "size {size} out of bounds at x={x}");
        x += 37.5;
    }
}

#[test]
fn bounds_changes_apply_mid_drag() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    resizer.begin(1000.0, 700.0);
    resizer.set_bounds(ResizeBounds::new(300.0, 800.0));
    assert_eq!(resizer.pointer_move(1500.0), Some(300.0));
    assert_eq!(resizer.pointer_move(0.0), Some(800.0));
}

#[test]
fn drag_sets_and_restores_cursor() {
    let surface = RecordingSurface::with_cursor("text");
    let mut resizer = resizer(&surface);
    resizer.begin(1000.0, 700.0);
    assert_eq!(surface.log().cursor.as_deref(), Some(RESIZE_CURSOR));
    assert!(resizer.pointer_up());
    assert_eq!(surface.log().cursor.as_deref(), Some("text"));
    assert!(!resizer.is_dragging());
}

#[test]
fn listeners_are_released_exactly_once() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    resizer.begin(1000.0, 700.0);
    assert!(resizer.pointer_up());
    assert!(!resizer.pointer_up());
    drop(resizer);

    let log = surface.log();
    assert_eq!(log.captures, 1);
    assert_eq!(log.releases, 1);
    assert_eq!(log.bad_releases, 0);
    assert!(log.active.is_empty());
}

#[test]
fn restarting_a_drag_releases_previous_session() {
    let surface = RecordingSurface::default();
    let mut resizer = resizer(&surface);
    resizer.begin(1000.0, 700.0);
    resizer.begin(900.0, 800.0);
    assert_eq!(surface.log().active.len(), 1);
    assert_eq!(surface.log().cursor.as_deref(), Some(RESIZE_CURSOR));
    resizer.pointer_up();
    assert_eq!(surface.log().cursor, None);
    assert_eq!(surface.log().bad_releases, 0);
}

#[test]
fn teardown_mid_drag_releases_listeners_and_cursor() {
    let surface = RecordingSurface::with_cursor("default");
    {
        let mut resizer = resizer(&surface);
        resizer.begin(1000.0, 700.0);
    }
    let log = surface.log();
    assert!(log.active.is_empty());
    assert_eq!(log.releases, 1);
    assert_eq!(log.cursor.as_deref(), Some("default"));
}

#[test]
fn headless_surface_tracks_cursor() {
    let mut resizer = DrawerResizer::new(Box::<HeadlessSurface>::default(), ResizeBounds::new(1.0, 2.0));
    resizer.begin(10.0, 1.5);
    assert_eq!(resizer.pointer_move(9.0), Some(2.0));
    assert!(resizer.pointer_up());
}
