//! Interactive tile and resize sessions
//!
//! The controller is fed the global input stream one event at a time and
//! advanced by [`TilingController::tick`]. It is always in exactly one of
//! three modes:
//!
//! * **Idle**: waiting for the tile or resize chord to be pressed.
//! * **Tile**: a target window is locked; the first mouse flick or arrow
//!   combination places it and ends the session.
//! * **Resize**: a target window is locked together with the edges nearest
//!   the cursor; mouse movement and arrow nudges drag those edges until the
//!   chord is released.
//!
//! Accessibility failures inside a session are logged and otherwise ignored.

use crate::config::Settings;
use crate::macos::accessibility::WindowId;
use crate::models::direction::{CycleStep, Direction};
use crate::models::geometry::{Point, Rect, Size};
use crate::models::input::{arrows_to_direction, ArrowKey, Chord, InputEvent, KeyCode, ModifierFlags};
use crate::models::screen::{primary_screen, screen_for_rect, sort_for_cycling, Screen};
use crate::services::animation::{AnimateOutcome, AnimationConfig, AnimationEngine, AnimationStyle};
use crate::services::frame_accessor::WindowFrameAccessor;
use crate::services::gesture_detector::{GestureConfig, GestureDetector};
use crate::services::movement_tracker::{MovementTracker, TrackerReport};
use crate::services::window_resolver::{ResolvedWindow, WindowResolver};
use crate::ui::overlay::{CursorStyle, HighlightOverlay};
use crate::Result;
use bitflags::bitflags;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Size granted by the OS above the request before we treat it as a floor
const MIN_SIZE_SLACK: f64 = 0.5;

bitflags! {
    /// Window edges dragged by a resize session
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResizeEdges: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

impl ResizeEdges {
    /// No edges selected: the session moves the whole window
    pub fn is_move(self) -> bool {
        self.is_empty()
    }

    fn cursor(self) -> CursorStyle {
        let horizontal = self.intersects(Self::LEFT | Self::RIGHT);
        let vertical = self.intersects(Self::TOP | Self::BOTTOM);
        match (horizontal, vertical) {
            (false, false) => CursorStyle::OpenHand,
            (true, false) => CursorStyle::ResizeLeftRight,
            (false, true) => CursorStyle::ResizeUpDown,
            (true, true) => CursorStyle::Crosshair,
        }
    }
}

/// Split the window into a 3x3 grid and select the edges nearest `cursor`.
/// Layout space: the top edge is at `max_y`.
pub fn classify_zone(frame: &Rect, cursor: Point, zone_low: f64, zone_high: f64) -> ResizeEdges {
    let rel_x = ((cursor.x - frame.min_x()) / frame.width().max(1.0)).clamp(0.0, 1.0);
    let rel_y = ((cursor.y - frame.min_y()) / frame.height().max(1.0)).clamp(0.0, 1.0);

    let mut edges = ResizeEdges::empty();
    if rel_x < zone_low {
        edges |= ResizeEdges::LEFT;
    } else if rel_x > zone_high {
        edges |= ResizeEdges::RIGHT;
    }
    if rel_y < zone_low {
        edges |= ResizeEdges::BOTTOM;
    } else if rel_y > zone_high {
        edges |= ResizeEdges::TOP;
    }
    edges
}

/// Apply a drag of `(dx, dy)` to the live edges of `initial`, never letting
/// the size drop below `min_size`. When the floor kicks in on a moving
/// left/bottom edge, the origin is pulled back by the clamped amount so the
/// opposite edge stays where it was.
pub fn resize_frame(initial: &Rect, edges: ResizeEdges, dx: f64, dy: f64, min_size: Size) -> Rect {
    if edges.is_move() {
        return initial.translated(dx, dy);
    }

    let mut x = initial.min_x();
    let mut y = initial.min_y();
    let mut width = initial.width();
    let mut height = initial.height();

    if edges.contains(ResizeEdges::LEFT) {
        x += dx;
        width -= dx;
    } else if edges.contains(ResizeEdges::RIGHT) {
        width += dx;
    }

    if edges.contains(ResizeEdges::BOTTOM) {
        y += dy;
        height -= dy;
    } else if edges.contains(ResizeEdges::TOP) {
        height += dy;
    }

    let floor_width = min_size.width.max(1.0);
    if width < floor_width {
        if edges.contains(ResizeEdges::LEFT) {
            x -= floor_width - width;
        }
        width = floor_width;
    }

    let floor_height = min_size.height.max(1.0);
    if height < floor_height {
        if edges.contains(ResizeEdges::BOTTOM) {
            y -= floor_height - height;
        }
        height = floor_height;
    }

    Rect::new(x, y, width, height)
}

/// Screen index reached by cycling from `index` in `step` direction, if any
pub fn neighbor_index(index: usize, count: usize, step: CycleStep) -> Option<usize> {
    if count < 2 {
        return None;
    }
    match step {
        CycleStep::Next => (index + 1 < count).then_some(index + 1),
        CycleStep::Previous => index.checked_sub(1),
        CycleStep::Cyclic => Some((index + 1) % count),
    }
}

/// Controller tunables, derived from [`Settings`]
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub tile_chord: Chord,
    pub resize_chord: Chord,
    pub placement_tolerance: f64,
    pub arrow_debounce: Duration,
    pub lookup_attempts: u32,
    pub arrow_step: f64,
    pub zone_low: f64,
    pub zone_high: f64,
    pub tracker_tolerance: f64,
    pub excluded_owners: Vec<String>,
    pub gesture: GestureConfig,
    pub animation: AnimationConfig,
}

impl ControllerConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            tile_chord: settings.tile_chord()?,
            resize_chord: settings.resize_chord()?,
            placement_tolerance: settings.tiling.placement_tolerance,
            arrow_debounce: settings.tiling.arrow_debounce(),
            lookup_attempts: settings.tiling.lookup_attempts,
            arrow_step: settings.resize.arrow_step,
            zone_low: settings.resize.zone_low,
            zone_high: settings.resize.zone_high,
            tracker_tolerance: settings.tracker.tolerance,
            excluded_owners: settings.tiling.excluded_owners.clone(),
            gesture: GestureConfig::from(&settings.gesture),
            animation: AnimationConfig::from(&settings.animation),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Tile,
    Resize,
}

#[derive(Debug)]
struct TileSession {
    /// Arrows currently held
    arrows: BTreeSet<ArrowKey>,
    /// Arrows tapped and let go inside the current aggregation window
    released: BTreeSet<ArrowKey>,
    arrow_deadline: Option<Instant>,
}

#[derive(Debug)]
struct ResizeSession {
    target: WindowId,
    initial_frame: Rect,
    initial_cursor: Point,
    edges: ResizeEdges,
    /// Visible bounds of the screen the window started on
    bounds: Rect,
    learned_min: Size,
    /// Accumulated arrow-key nudges
    nudge: (f64, f64),
}

#[derive(Debug)]
enum Session {
    Idle,
    Tile(TileSession),
    Resize(ResizeSession),
}

#[derive(Debug, Clone, Copy)]
struct LastOperation {
    window_id: WindowId,
    cursor: Point,
}

pub struct TilingController {
    config: ControllerConfig,
    accessor: Arc<WindowFrameAccessor>,
    overlay: Arc<dyn HighlightOverlay>,
    resolver: WindowResolver,
    detector: GestureDetector,
    animation: AnimationEngine,
    tracker: MovementTracker,
    session: Session,
    modifiers: ModifierFlags,
    keys_down: BTreeSet<KeyCode>,
    cursor: Point,
    tile_was_satisfied: bool,
    resize_was_satisfied: bool,
    locked_window: Option<WindowId>,
    last_operation: Option<LastOperation>,
}

impl TilingController {
    pub fn new(
        config: ControllerConfig,
        accessor: Arc<WindowFrameAccessor>,
        overlay: Arc<dyn HighlightOverlay>,
        own_pid: i32,
    ) -> Self {
        Self {
            resolver: WindowResolver::new(config.excluded_owners.clone(), own_pid),
            detector: GestureDetector::new(config.gesture.clone()),
            animation: AnimationEngine::new(config.animation.clone()),
            tracker: MovementTracker::new(config.tracker_tolerance),
            config,
            accessor,
            overlay,
            session: Session::Idle,
            modifiers: ModifierFlags::empty(),
            keys_down: BTreeSet::new(),
            cursor: Point::default(),
            tile_was_satisfied: false,
            resize_was_satisfied: false,
            locked_window: None,
            last_operation: None,
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self.session {
            Session::Idle => SessionMode::Idle,
            Session::Tile(_) => SessionMode::Tile,
            Session::Resize(_) => SessionMode::Resize,
        }
    }

    /// Window locked by the active session
    pub fn locked_window(&self) -> Option<WindowId> {
        self.locked_window
    }

    /// Edges live in the current resize session
    pub fn resize_edges(&self) -> Option<ResizeEdges> {
        match &self.session {
            Session::Resize(session) => Some(session.edges),
            _ => None,
        }
    }

    /// Sizes learned from OS refusals in the current resize session
    pub fn learned_minimum(&self) -> Option<Size> {
        match &self.session {
            Session::Resize(session) => Some(session.learned_min),
            _ => None,
        }
    }

    pub fn animation(&self) -> &AnimationEngine {
        &self.animation
    }

    pub fn tracker(&self) -> &MovementTracker {
        &self.tracker
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Modifiers and keys currently held, as last reported
    pub fn held_input(&self) -> (ModifierFlags, &BTreeSet<KeyCode>) {
        (self.modifiers, &self.keys_down)
    }

    /// Feed one global input event
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::ModifiersChanged { modifiers, cursor } => {
                self.cursor = cursor;
                self.modifiers = modifiers;
                self.evaluate_chords(now);
            }
            InputEvent::KeyDown { key, cursor } => {
                self.cursor = cursor;
                if !self.keys_down.insert(key) {
                    return;
                }
                self.key_down(key, now);
                self.evaluate_chords(now);
            }
            InputEvent::KeyUp { key } => {
                self.keys_down.remove(&key);
                if let (Session::Tile(session), Some(arrow)) = (&mut self.session, key.arrow()) {
                    if session.arrows.remove(&arrow) {
                        session.released.insert(arrow);
                    }
                }
                self.evaluate_chords(now);
            }
            InputEvent::MouseMoved { cursor } => {
                self.cursor = cursor;
                self.mouse_moved(now);
            }
        }
    }

    /// Advance animations and expire the arrow aggregation window
    pub fn tick(&mut self, now: Instant) {
        self.animation.tick(&self.accessor, self.overlay.as_ref(), now);

        let due = match &self.session {
            Session::Tile(session) => session.arrow_deadline.is_some_and(|deadline| now >= deadline),
            _ => false,
        };
        if due {
            self.commit_arrows(now);
        }
    }

    /// Enter tile mode on the window under the cursor. Returns false when
    /// permission is missing or there is no window to act on.
    pub fn enter_tile_mode(&mut self, now: Instant) -> bool {
        self.exit_active_mode();
        let Some(target) = self.resolve_target() else {
            return false;
        };

        self.accessor.raise(target.window_id);
        self.detector.reset(self.cursor, now);
        self.overlay.show(target.frame);
        self.locked_window = Some(target.window_id);
        self.session = Session::Tile(TileSession {
            arrows: BTreeSet::new(),
            released: BTreeSet::new(),
            arrow_deadline: None,
        });
        debug!(window_id = target.window_id, owner = %target.owner_name, "Tile mode");
        true
    }

    /// Enter resize mode on the window under the cursor, choosing live edges
    /// from where the cursor sits inside it
    pub fn enter_resize_mode(&mut self, _now: Instant) -> bool {
        self.exit_active_mode();
        let Some(target) = self.resolve_target() else {
            return false;
        };

        let edges = classify_zone(&target.frame, self.cursor, self.config.zone_low, self.config.zone_high);
        let screens = self.accessor.screens();
        let bounds = screen_for_rect(&screens, &target.frame)
            .or_else(|| primary_screen(&screens))
            .map(|s| s.visible_frame)
            .unwrap_or(target.frame);

        // A placement still in flight would overwrite the drag.
        self.animation.cancel(target.window_id);
        self.accessor.raise(target.window_id);
        self.overlay.show(target.frame);
        self.overlay.set_cursor(edges.cursor());
        self.locked_window = Some(target.window_id);
        self.session = Session::Resize(ResizeSession {
            target: target.window_id,
            initial_frame: target.frame,
            initial_cursor: self.cursor,
            edges,
            bounds,
            learned_min: Size::default(),
            nudge: (0.0, 0.0),
        });
        debug!(window_id = target.window_id, ?edges, "Resize mode");
        true
    }

    /// Leave any active mode. Pending arrow aggregation is discarded;
    /// animations already started run to completion.
    pub fn exit_active_mode(&mut self) {
        if matches!(self.session, Session::Idle) {
            return;
        }
        self.detector.disarm();
        self.overlay.hide();
        self.overlay.set_cursor(CursorStyle::Default);
        self.locked_window = None;
        self.session = Session::Idle;
        trace!("Session ended");
    }

    /// Place the locked window for `direction`. If it already sits there,
    /// cycle it to the neighbouring screen instead. Returns false when the
    /// window could not be read or written.
    pub fn apply_direction(&mut self, direction: Direction, now: Instant) -> bool {
        let Some(window_id) = self.locked_window else {
            return false;
        };
        let Some(current) = self.accessor.frame_of(window_id) else {
            debug!(window_id, "Target window vanished");
            return false;
        };
        // Mid-animation, judge placement by where the window is headed.
        let effective = self.animation.pending_target(window_id).unwrap_or(current);

        let mut screens = self.accessor.screens();
        sort_for_cycling(&mut screens);
        let Some(index) = screen_index(&screens, &effective) else {
            debug!(window_id, "Window is on no screen");
            return false;
        };

        let mut target = direction.target_rect(&screens[index].visible_frame);
        if effective.approx_eq(&target, self.config.placement_tolerance) {
            match neighbor_index(index, screens.len(), direction.cycle_step()) {
                Some(next) => {
                    target = direction.target_rect(&screens[next].visible_frame);
                    debug!(window_id, %direction, from = screens[index].id, to = screens[next].id, "Cycling screen");
                }
                None => {
                    trace!(window_id, %direction, "Already placed at the edge of the desktop");
                    self.last_operation = Some(LastOperation { window_id, cursor: self.cursor });
                    return true;
                }
            }
        }

        match self.animation.animate(&self.accessor, window_id, target, AnimationStyle::Placement, now) {
            AnimateOutcome::Failed => false,
            outcome => {
                if outcome == AnimateOutcome::Applied {
                    self.overlay.pulse(target);
                }
                self.overlay.move_to(target);
                self.tracker.record_frame(window_id, direction, target);
                self.last_operation = Some(LastOperation { window_id, cursor: self.cursor });
                info!(window_id, %direction, ?target, "Placed window");
                true
            }
        }
    }

    /// Re-snap tracked windows after a display or Dock change
    pub fn screen_parameters_changed(&mut self) -> TrackerReport {
        self.tracker
            .screen_parameters_changed(&self.accessor, &mut self.animation)
    }

    fn resolve_target(&self) -> Option<ResolvedWindow> {
        if let Err(error) = self.accessor.ensure_permissions() {
            warn!(%error, "Cannot start a session");
            return None;
        }

        // Under a stationary cursor keep acting on the window we just moved,
        // even if it shrank away from the pointer.
        if let Some(last) = self.last_operation {
            if last.cursor == self.cursor {
                if let Some(frame) = self.accessor.frame_of(last.window_id) {
                    let owner = self
                        .accessor
                        .on_screen_windows()
                        .ok()
                        .and_then(|windows| windows.into_iter().find(|w| w.window_id == last.window_id));
                    if let Some(entry) = owner {
                        return Some(ResolvedWindow {
                            frame,
                            ..ResolvedWindow::from(&entry)
                        });
                    }
                }
            }
        }

        let mut target = self
            .resolver
            .resolve(&self.accessor, self.cursor, self.config.lookup_attempts)?;
        if let Some(frame) = self.accessor.frame_of(target.window_id) {
            target.frame = frame;
        }
        Some(target)
    }

    fn evaluate_chords(&mut self, now: Instant) {
        let tile = self.config.tile_chord.is_satisfied(self.modifiers, &self.keys_down);
        let resize = self.config.resize_chord.is_satisfied(self.modifiers, &self.keys_down);
        let tile_rose = tile && !self.tile_was_satisfied;
        let resize_rose = resize && !self.resize_was_satisfied;
        self.tile_was_satisfied = tile;
        self.resize_was_satisfied = resize;

        let wanted = match (tile, resize) {
            (true, true) => {
                if self.config.resize_chord.specificity() >= self.config.tile_chord.specificity() {
                    SessionMode::Resize
                } else {
                    SessionMode::Tile
                }
            }
            (true, false) => SessionMode::Tile,
            (false, true) => SessionMode::Resize,
            (false, false) => SessionMode::Idle,
        };

        match (self.mode(), wanted) {
            (SessionMode::Idle, SessionMode::Tile) if tile_rose => {
                self.enter_tile_mode(now);
            }
            (SessionMode::Idle, SessionMode::Resize) if resize_rose => {
                self.enter_resize_mode(now);
            }
            (SessionMode::Tile, SessionMode::Resize) => {
                self.exit_active_mode();
                self.enter_resize_mode(now);
            }
            (SessionMode::Resize, SessionMode::Tile) => {
                self.exit_active_mode();
                self.enter_tile_mode(now);
            }
            (SessionMode::Tile, SessionMode::Idle) | (SessionMode::Resize, SessionMode::Idle) => {
                self.exit_active_mode();
            }
            _ => {}
        }
    }

    fn is_chord_key(&self, key: KeyCode) -> bool {
        self.config.tile_chord.key == Some(key) || self.config.resize_chord.key == Some(key)
    }

    fn key_down(&mut self, key: KeyCode, now: Instant) {
        if key == KeyCode::ESCAPE {
            self.exit_active_mode();
            return;
        }

        let arrow = key.arrow();
        let debounce = self.config.arrow_debounce;
        let step = self.config.arrow_step;

        match (&mut self.session, arrow) {
            (Session::Tile(session), Some(arrow)) => {
                session.arrows.insert(arrow);
                session.released.remove(&arrow);
                if session.arrows.len() > 2 {
                    debug!("Too many arrows held, ending tile session");
                    self.exit_active_mode();
                    return;
                }
                if session.arrow_deadline.is_none() {
                    session.arrow_deadline = Some(now + debounce);
                }
                if debounce.is_zero() {
                    self.commit_arrows(now);
                }
            }
            (Session::Tile(_), None) => {
                if !self.is_chord_key(key) {
                    trace!(key = key.0, "Non-arrow key ends tile session");
                    self.exit_active_mode();
                }
            }
            (Session::Resize(session), Some(arrow)) => {
                let (ux, uy) = arrow.unit_vector();
                session.nudge.0 += ux * step;
                session.nudge.1 += uy * step;
                self.apply_resize();
            }
            _ => {}
        }
    }

    fn commit_arrows(&mut self, now: Instant) {
        let arrows = match &mut self.session {
            // Arrows still held decide; a completed tap falls back to what was let go.
            Session::Tile(session) => {
                session.arrow_deadline = None;
                let released = std::mem::take(&mut session.released);
                if session.arrows.is_empty() {
                    released
                } else {
                    std::mem::take(&mut session.arrows)
                }
            }
            _ => return,
        };

        match arrows_to_direction(&arrows) {
            Some(direction) => {
                if !self.apply_direction(direction, now) {
                    return;
                }
            }
            None => debug!(?arrows, "Arrow combination has no direction"),
        }
        self.exit_active_mode();
    }

    fn mouse_moved(&mut self, now: Instant) {
        match self.mode() {
            SessionMode::Tile => {
                let screens = self.accessor.screens();
                if let Some(direction) = self.detector.update(self.cursor, &screens, now) {
                    // A failed placement leaves the session for the chord release to end.
                    if self.apply_direction(direction, now) {
                        self.exit_active_mode();
                    }
                }
            }
            SessionMode::Resize => self.apply_resize(),
            SessionMode::Idle => {}
        }
    }

    /// Recompute the resize session's frame from the total cursor
    /// displacement plus nudges, write it, and learn any size floor the OS
    /// enforced.
    fn apply_resize(&mut self) {
        let cursor = self.cursor;
        let accessor = Arc::clone(&self.accessor);
        let Session::Resize(session) = &mut self.session else {
            return;
        };

        let dx = cursor.x - session.initial_cursor.x + session.nudge.0;
        let dy = cursor.y - session.initial_cursor.y + session.nudge.1;
        let os_min = accessor.minimum_size(session.target).unwrap_or_default();

        let Some(requested) = session.propose(dx, dy, os_min) else {
            trace!("Resize fell outside the screen");
            return;
        };
        if !accessor.set_frame(session.target, requested) {
            return;
        }
        let Some(mut actual) = accessor.frame_of(session.target) else {
            return;
        };

        if !session.edges.is_move() && session.learn_minimum(&requested, &actual) {
            debug!(learned = ?session.learned_min, "OS refused to shrink further");
            if let Some(corrected) = session.propose(dx, dy, os_min) {
                if accessor.set_frame(session.target, corrected) {
                    actual = accessor.frame_of(session.target).unwrap_or(corrected);
                }
            }
        }

        self.overlay.move_to(actual);
    }
}

impl ResizeSession {
    fn propose(&self, dx: f64, dy: f64, os_min: Size) -> Option<Rect> {
        let floor = Size::new(
            self.learned_min.width.max(os_min.width),
            self.learned_min.height.max(os_min.height),
        );
        resize_frame(&self.initial_frame, self.edges, dx, dy, floor).intersection(&self.bounds)
    }

    /// Record sizes the OS granted beyond the request. Returns true when a
    /// floor was raised.
    fn learn_minimum(&mut self, requested: &Rect, actual: &Rect) -> bool {
        let mut learned = false;
        if actual.width() > requested.width() + MIN_SIZE_SLACK && actual.width() > self.learned_min.width {
            self.learned_min.width = actual.width();
            learned = true;
        }
        if actual.height() > requested.height() + MIN_SIZE_SLACK && actual.height() > self.learned_min.height {
            self.learned_min.height = actual.height();
            learned = true;
        }
        learned
    }
}

fn screen_index(screens: &[Screen], rect: &Rect) -> Option<usize> {
    let screen = screen_for_rect(screens, rect)?;
    screens.iter().position(|s| s.id == screen.id)
}
