use std::sync::{Arc, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::errors::EngineError;
use crate::events::EngineEvent;
use crate::geometry::{Point, Region, RegionMask};
use crate::logging::LogFile;
use crate::trial::{TrackRecord, Trial, ZoneState};
use crate::zone::{ZoneCallback, ZoneHandle, ZoneId, ZoneRegistry};

/// Per-frame ingestion and trial state machine.
///
/// Converts raw pixel positions to normalized space, drives the zone
/// registry with per-(zone, pointer) hysteresis, accumulates track records,
/// and flushes them per trial to the session log.
pub struct TrialController {
    registry: ZoneRegistry,
    handles: Vec<ZoneHandle>,
    state: ZoneState,
    trial: Trial,
    records: Vec<TrackRecord>,
    /// Raw pixel positions from the previous frame, for change detection
    /// and segment interpolation.
    prev_raw: Vec<(f64, f64)>,
    resolution: (u32, u32),
    session_log: LogFile,
    started: Instant,
    event_tx: broadcast::Sender<EngineEvent>,
    /// Snapshot shared with the sync loop; replaced wholesale so readers
    /// always see a complete coordinate set.
    snapshot: Arc<RwLock<Vec<Point>>>,
}

impl TrialController {
    pub fn new(
        resolution: (u32, u32),
        session_log: LogFile,
        started: Instant,
        event_tx: broadcast::Sender<EngineEvent>,
        snapshot: Arc<RwLock<Vec<Point>>>,
    ) -> Self {
        Self {
            registry: ZoneRegistry::new(),
            handles: Vec::new(),
            state: ZoneState::new(),
            trial: Trial::new(),
            records: Vec::new(),
            prev_raw: Vec::new(),
            resolution,
            session_log,
            started,
            event_tx,
            snapshot,
        }
    }

    /// Mask granularity tracks one source-image pixel.
    fn cell_size(&self) -> f64 {
        1.0 / self.resolution.0.max(self.resolution.1).max(1) as f64
    }

    /// Replace the active zone set and start (or restart) a trial.
    ///
    /// Advances the trial number iff the previous trial was saved, releases
    /// the old zones, registers the new ones, resizes the hysteresis table
    /// (new zones start outside for every pointer), and clears the record
    /// buffer. A malformed region fails the whole call before the live set
    /// is touched.
    pub fn setup(&mut self, zones: Vec<(Region, ZoneCallback)>) -> Result<(), EngineError> {
        let cell = self.cell_size();
        for (region, _) in &zones {
            RegionMask::build(region, cell)?;
        }

        self.trial.roll();

        for handle in self.handles.drain(..) {
            handle.release();
        }
        for (region, callback) in zones {
            self.handles.push(self.registry.add(region, cell, callback)?);
        }

        self.state.resize(self.handles.len(), self.state.pointers());
        self.records.clear();
        log::debug!(
            "trial {} configured with {} zones",
            self.trial.number,
            self.handles.len()
        );
        Ok(())
    }

    /// Ingest one frame's raw pixel-space pointer positions.
    ///
    /// A call with positions identical to the previous one is a no-op: no
    /// records, no callbacks. Otherwise each pointer's movement segment is
    /// tested against every zone; a callback fires only when the stored
    /// inside/outside flag flips. One record is appended per zone tested,
    /// carrying the running "active zone" (the last zone index hit so far
    /// this frame, id 0 when none).
    pub fn on_frame(&mut self, raw: &[(f64, f64)]) {
        if raw == self.prev_raw.as_slice() {
            return;
        }

        let (width, height) = self.resolution;
        let ids = self.registry.ids();
        self.state.resize(ids.len(), raw.len());

        let elapsed = self.started.elapsed().as_secs_f64();
        let trial = self.trial.number;
        let mut current = Vec::with_capacity(raw.len());

        for (pointer, &(px, py)) in raw.iter().enumerate() {
            let curr = Point::from_pixel(px, py, width, height);
            // A pointer that just appeared has no previous position; its
            // segment collapses to a point test.
            let prev = self
                .prev_raw
                .get(pointer)
                .map(|&(x, y)| Point::from_pixel(x, y, width, height))
                .unwrap_or(curr);

            let hits = self.registry.test(prev, curr, false, false);
            let mut active = ZoneId::NONE;
            for (index, &hit) in hits.iter().enumerate() {
                let was = self.state.get(index, pointer);
                if hit != was {
                    self.state.set(index, pointer, hit);
                    self.registry.notify(ids[index], curr.x, curr.y, hit);
                    let _ = self.event_tx.send(EngineEvent::ZoneCrossed {
                        zone: ids[index],
                        x: curr.x,
                        y: curr.y,
                        entered: hit,
                    });
                }
                if hit {
                    active = ids[index];
                }
                self.records.push(TrackRecord {
                    time: elapsed,
                    x: curr.x,
                    y: curr.y,
                    pointer,
                    zone: active,
                    trial,
                });
            }
            current.push(curr);
        }

        self.prev_raw = raw.to_vec();
        *self.snapshot.write().unwrap() = current.clone();
        let _ = self
            .event_tx
            .send(EngineEvent::PositionChanged { positions: current });
    }

    /// Flush the buffered records of the current trial to the session log.
    ///
    /// An empty buffer is a plain no-op: nothing is written and the saved
    /// flag is untouched, so only a completed save-then-setup cycle
    /// advances the trial number. I/O failures propagate.
    pub fn save(&mut self) -> Result<(), EngineError> {
        if self.records.is_empty() {
            return Ok(());
        }

        let mut rows = String::new();
        for record in &self.records {
            rows.push_str(&record.csv_row());
            rows.push('\n');
        }
        self.session_log.append(&rows)?;

        let flushed = self.records.len();
        self.records.clear();
        self.trial.saved = true;
        log::info!("trial {} saved ({flushed} records)", self.trial.number);
        let _ = self.event_tx.send(EngineEvent::TrialSaved {
            trial: self.trial.number,
            records: flushed,
        });
        Ok(())
    }

    /// Release every zone handle. Called during teardown, after tick
    /// delivery has stopped.
    pub fn teardown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.release();
        }
        self.state.resize(0, self.state.pointers());
    }

    pub fn trial_number(&self) -> u32 {
        self.trial.number
    }

    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    pub fn zone_ids(&self) -> Vec<ZoneId> {
        self.registry.ids()
    }

    /// Latest complete normalized position set.
    pub fn positions(&self) -> Vec<Point> {
        self.snapshot.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::Rng;

    use super::*;
    use crate::trial::SESSION_LOG_HEADER;
    use crate::zone::noop_callback;

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    struct Fixture {
        controller: TrialController,
        _dir: tempfile::TempDir,
        log_path: std::path::PathBuf,
        _event_rx: broadcast::Receiver<EngineEvent>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("session.csv");
        let (event_tx, event_rx) = broadcast::channel(64);
        let controller = TrialController::new(
            (WIDTH, HEIGHT),
            LogFile::new(&log_path, SESSION_LOG_HEADER),
            Instant::now(),
            event_tx,
            Arc::new(RwLock::new(Vec::new())),
        );
        Fixture {
            controller,
            _dir: dir,
            log_path,
            _event_rx: event_rx,
        }
    }

    /// Zone covering the center of the frame, in normalized coordinates.
    fn center_zone() -> Region {
        Region::rect(Point::new(-0.05, -0.05), Point::new(0.05, 0.05))
    }

    fn counting_callback() -> (ZoneCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let cb: ZoneCallback = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (cb, count)
    }

    /// Pixel position of the frame center.
    const CENTER: (f64, f64) = (320.0, 240.0);
    /// Pixel position far outside the center zone.
    const OUTSIDE: (f64, f64) = (20.0, 20.0);

    #[test]
    fn identical_frames_are_idempotent() {
        let mut f = fixture();
        f.controller
            .setup(vec![(center_zone(), noop_callback())])
            .unwrap();

        f.controller.on_frame(&[CENTER]);
        let after_first = f.controller.pending_records();
        assert_eq!(after_first, 1);

        f.controller.on_frame(&[CENTER]);
        assert_eq!(f.controller.pending_records(), after_first);
    }

    #[test]
    fn enter_fires_exactly_once_until_exit() {
        let mut f = fixture();
        let (cb, count) = counting_callback();
        f.controller.setup(vec![(center_zone(), cb)]).unwrap();

        f.controller.on_frame(&[OUTSIDE]);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        f.controller.on_frame(&[CENTER]);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Linger inside with jittered positions: no re-fire.
        let mut rng = rand::rng();
        for _ in 0..8 {
            let dx: f64 = rng.random_range(-5.0..5.0);
            let dy: f64 = rng.random_range(-5.0..5.0);
            f.controller.on_frame(&[(CENTER.0 + dx, CENTER.1 + dy)]);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Moving out: that frame's segment still touches the zone, so the
        // exit registers on the following, fully-outside move.
        f.controller.on_frame(&[OUTSIDE]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        f.controller.on_frame(&[(21.0, 21.0)]);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Re-entry fires again.
        f.controller.on_frame(&[CENTER]);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn one_record_per_zone_tested_per_pointer() {
        let mut f = fixture();
        f.controller
            .setup(vec![
                (center_zone(), noop_callback()),
                (
                    Region::rect(Point::new(0.2, 0.2), Point::new(0.3, 0.3)),
                    noop_callback(),
                ),
            ])
            .unwrap();

        f.controller.on_frame(&[CENTER, OUTSIDE]);
        // 2 pointers x 2 zones.
        assert_eq!(f.controller.pending_records(), 4);
    }

    #[test]
    fn trial_lifecycle_advances_on_save_then_setup() {
        let mut f = fixture();
        f.controller
            .setup(vec![(center_zone(), noop_callback())])
            .unwrap();
        assert_eq!(f.controller.trial_number(), 1);
        let first_ids = f.controller.zone_ids();

        f.controller.on_frame(&[CENTER]);
        f.controller.save().unwrap();
        assert_eq!(f.controller.trial_number(), 1);
        assert_eq!(f.controller.pending_records(), 0);

        let other = Region::rect(Point::new(-0.2, -0.2), Point::new(-0.1, -0.1));
        f.controller.setup(vec![(other, noop_callback())]).unwrap();
        assert_eq!(f.controller.trial_number(), 2);
        assert_eq!(f.controller.pending_records(), 0);
        let second_ids = f.controller.zone_ids();
        assert_eq!(second_ids.len(), 1);
        assert_ne!(first_ids, second_ids);

        let body = std::fs::read_to_string(&f.log_path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], SESSION_LOG_HEADER);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].trim_end().ends_with(", 1"));
    }

    #[test]
    fn save_with_empty_buffer_is_a_noop() {
        let mut f = fixture();
        f.controller
            .setup(vec![(center_zone(), noop_callback())])
            .unwrap();

        f.controller.save().unwrap();
        assert!(!f.log_path.exists());

        // The empty save must not have marked the trial as saved.
        f.controller
            .setup(vec![(center_zone(), noop_callback())])
            .unwrap();
        assert_eq!(f.controller.trial_number(), 1);
    }

    #[test]
    fn invalid_region_fails_setup_without_touching_zones() {
        let mut f = fixture();
        f.controller
            .setup(vec![(center_zone(), noop_callback())])
            .unwrap();
        let live = f.controller.zone_ids();

        let bad = Region::new(vec![Point::new(0.0, 0.0)]);
        let result = f.controller.setup(vec![
            (center_zone(), noop_callback()),
            (bad, noop_callback()),
        ]);
        assert!(matches!(result, Err(EngineError::InvalidRegion(_))));
        assert_eq!(f.controller.zone_ids(), live);
    }

    #[test]
    fn new_pointer_starts_outside_every_zone() {
        let mut f = fixture();
        let (cb, count) = counting_callback();
        f.controller.setup(vec![(center_zone(), cb)]).unwrap();

        f.controller.on_frame(&[OUTSIDE]);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Second pointer appears directly inside the zone: one enter.
        f.controller.on_frame(&[OUTSIDE, CENTER]);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Second pointer disappears; its state column is dropped, records
        // already buffered are retained.
        let before = f.controller.pending_records();
        f.controller.on_frame(&[(21.0, 20.0)]);
        assert!(f.controller.pending_records() > before);

        // Reappearing inside counts as a fresh enter.
        f.controller.on_frame(&[(21.0, 20.0), CENTER]);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fast_crossing_between_frames_fires_enter() {
        let mut f = fixture();
        let (cb, count) = counting_callback();
        // Thin vertical band through the frame center, about two pixels wide.
        let band = Region::rect(Point::new(-0.002, -0.3), Point::new(0.002, 0.3));
        f.controller.setup(vec![(band, cb)]).unwrap();

        f.controller.on_frame(&[(100.0, 240.0)]);
        // Jump across the band in one frame; interpolation must catch it.
        f.controller.on_frame(&[(540.0, 240.0)]);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // The next short move tests a segment clear of the band: exit.
        f.controller.on_frame(&[(542.0, 240.0)]);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn active_zone_records_last_hit_zone_only() {
        let mut f = fixture();
        // Two overlapping zones around the center.
        f.controller
            .setup(vec![
                (center_zone(), noop_callback()),
                (
                    Region::rect(Point::new(-0.1, -0.1), Point::new(0.1, 0.1)),
                    noop_callback(),
                ),
            ])
            .unwrap();
        let ids = f.controller.zone_ids();

        f.controller.on_frame(&[CENTER]);
        f.controller.save().unwrap();

        let body = std::fs::read_to_string(&f.log_path).unwrap();
        let rows: Vec<&str> = body.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        // The last row carries the last-tested hit zone.
        let last_zone: Vec<&str> = rows[1].split(", ").collect();
        assert_eq!(last_zone[4], ids[1].as_u32().to_string());
    }

    #[test]
    fn position_snapshot_holds_full_normalized_array() {
        let mut f = fixture();
        f.controller.setup(vec![]).unwrap();
        f.controller.on_frame(&[CENTER, (0.0, 0.0)]);

        let positions = f.controller.positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0], Point::new(0.0, 0.0));
        assert_eq!(positions[1], Point::from_pixel(0.0, 0.0, WIDTH, HEIGHT));
    }
}
