//! Frame sequencer: plays an ordered list of frames onto a single node at a
//! fixed rate.
//!
//! The sequencer owns no game logic. It borrows the scheduler and surface for
//! each call so its owner can keep them alongside other timers and nodes.
//!
//! # Invariants
//!
//! - `frame_interval = 1000 ms / max(frame_rate, 1)`
//! - while playing, `current_frame < frames.len()`
//! - a failed load leaves no frames and `loaded == false`
//! - a non-looping playback reports [`Playback::Finished`] at most once

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SequencerError;
use crate::loader::FrameLoader;
use crate::scheduler::{Scheduler, TimerId};
use crate::surface::{NodeId, Surface};

/// Outcome of a frame tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Playback {
    /// Moved to the next frame (or wrapped, when looping).
    Advanced,
    /// A non-looping playback ran past its last frame and stopped.
    Finished,
}

#[derive(Debug)]
pub struct FrameSequencer<F> {
    frames: Vec<F>,
    loaded: bool,
    playing: bool,
    current: usize,
    interval: Duration,
    looping: bool,
    node: Option<NodeId>,
    timer: Option<TimerId>,
}

/// Interval between frames; rates below 1 are treated as 1.
pub fn frame_interval(frame_rate: i32) -> Duration {
    Duration::from_millis(1000) / frame_rate.max(1) as u32
}

impl<F> FrameSequencer<F> {
    pub fn new(frame_rate: i32, looping: bool) -> Self {
        Self {
            frames: Vec::new(),
            loaded: false,
            playing: false,
            current: 0,
            interval: frame_interval(frame_rate),
            looping,
            node: None,
            timer: None,
        }
    }

    /// Resolve every id into a frame. Fails on an empty list or on the first
    /// id that does not resolve. A second call after success does nothing.
    pub fn load<L, S>(&mut self, ids: &[S], loader: &mut L) -> Result<(), SequencerError>
    where
        L: FrameLoader<Frame = F>,
        S: AsRef<str>,
    {
        if self.loaded {
            return Ok(());
        }
        if ids.is_empty() {
            return Err(SequencerError::NoFrames);
        }

        let frames = ids
            .iter()
            .map(|id| loader.resolve(id.as_ref()))
            .collect::<Result<Vec<F>, _>>()?;

        info!(frames = frames.len(), "Animation frames loaded");
        self.frames = frames;
        self.loaded = true;
        Ok(())
    }

    /// Begin playback from frame 0, reusing the node from an earlier run.
    pub fn start<S, V>(&mut self, scheduler: &mut S, surface: &mut V) -> Result<(), SequencerError>
    where
        S: Scheduler + ?Sized,
        V: Surface<Frame = F> + ?Sized,
    {
        let blocked = if !self.loaded {
            Some(SequencerError::NotLoaded)
        } else if self.frames.is_empty() {
            Some(SequencerError::NoFrames)
        } else if self.playing {
            Some(SequencerError::AlreadyPlaying)
        } else {
            None
        };
        if let Some(err) = blocked {
            warn!(error = %err, "Ignoring start");
            return Err(err);
        }

        let node = *self.node.get_or_insert_with(|| surface.add_node());
        self.current = 0;
        surface.show_frame(node, &self.frames[0]);
        surface.request_redraw();

        self.playing = true;
        self.timer = Some(scheduler.every(self.interval));
        debug!(interval_ms = self.interval.as_millis() as u64, looping = self.looping, "Playback started");
        Ok(())
    }

    /// Handle a fired timer. Returns `None` when the timer is not ours.
    pub fn on_timer<S, V>(&mut self, id: TimerId, scheduler: &mut S, surface: &mut V) -> Option<Playback>
    where
        S: Scheduler + ?Sized,
        V: Surface<Frame = F> + ?Sized,
    {
        if self.timer != Some(id) {
            return None;
        }

        let mut outcome = Playback::Advanced;
        if self.current + 1 >= self.frames.len() {
            if self.looping {
                self.current = 0;
            } else {
                self.stop(scheduler);
                outcome = Playback::Finished;
            }
        } else {
            self.current += 1;
        }

        if outcome == Playback::Advanced {
            if let (Some(node), Some(frame)) = (self.node, self.frames.get(self.current)) {
                surface.show_frame(node, frame);
            }
        }
        surface.request_redraw();

        if outcome == Playback::Finished {
            debug!("Playback finished");
        }
        Some(outcome)
    }

    /// Cancel the frame timer. Safe to call when already stopped.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        self.playing = false;
    }

    /// Stop, release the node and forget the frames.
    pub fn destroy<S, V>(&mut self, scheduler: &mut S, surface: &mut V)
    where
        S: Scheduler + ?Sized,
        V: Surface<Frame = F> + ?Sized,
    {
        self.stop(scheduler);
        if let Some(node) = self.node.take() {
            surface.remove_node(node);
        }
        self.frames.clear();
        self.loaded = false;
        self.current = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_interval(&self) -> Duration {
        self.interval
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::scheduler::TimerQueue;
    use crate::surface::FrameSurface;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    struct CountingLoader {
        frames: HashMap<String, String>,
        calls: usize,
    }

    impl CountingLoader {
        fn new(ids: &[&str]) -> Self {
            Self {
                frames: ids.iter().map(|id| (id.to_string(), format!("<{id}>"))).collect(),
                calls: 0,
            }
        }
    }

    impl FrameLoader for CountingLoader {
        type Frame = String;

        fn resolve(&mut self, id: &str) -> Result<String, LoadError> {
            self.calls += 1;
            self.frames
                .get(id)
                .cloned()
                .ok_or_else(|| LoadError::new(id, "missing"))
        }
    }

    fn loaded(ids: &[&str], looping: bool) -> FrameSequencer<String> {
        let mut seq = FrameSequencer::new(10, looping);
        seq.load(ids, &mut CountingLoader::new(ids)).unwrap();
        seq
    }

    fn tick(
        seq: &mut FrameSequencer<String>,
        sched: &mut TimerQueue,
        surface: &mut FrameSurface<String>,
        until: Duration,
    ) -> Vec<Playback> {
        let mut out = vec![];
        while let Some(id) = sched.pop_due(until) {
            if let Some(p) = seq.on_timer(id, sched, surface) {
                out.push(p);
            }
        }
        out
    }

    #[test]
    fn frame_rate_is_clamped_to_one() {
        assert_eq!(frame_interval(0), Duration::from_millis(1000));
        assert_eq!(frame_interval(-5), Duration::from_millis(1000));
        assert_eq!(frame_interval(1), Duration::from_millis(1000));
        assert_eq!(frame_interval(8), Duration::from_millis(125));
        assert_eq!(
            FrameSequencer::<String>::new(i32::MIN, false).frame_interval(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn empty_load_fails_and_stays_unloaded() {
        let mut seq = FrameSequencer::<String>::new(10, false);
        let ids: [&str; 0] = [];
        let err = seq.load(&ids, &mut CountingLoader::new(&[])).unwrap_err();

        assert_eq!(err, SequencerError::NoFrames);
        assert_eq!(err.to_string(), "No animation frames loaded");
        assert!(!seq.is_loaded());
    }

    #[test]
    fn one_bad_frame_fails_the_whole_load() {
        let mut seq = FrameSequencer::<String>::new(10, false);
        let mut loader = CountingLoader::new(&["a", "c"]);
        let err = seq.load(&["a", "b", "c"], &mut loader).unwrap_err();

        assert_matches!(err, SequencerError::Load(LoadError { ref id, .. }) if id == "b");
        assert!(!seq.is_loaded());
        assert_eq!(seq.frame_count(), 0);
        // fail fast: "c" is never requested
        assert_eq!(loader.calls, 2);
    }

    #[test]
    fn second_load_is_a_noop() {
        let mut seq = FrameSequencer::<String>::new(10, false);
        let mut loader = CountingLoader::new(&["a", "b"]);
        seq.load(&["a", "b"], &mut loader).unwrap();
        seq.load(&["a", "b"], &mut loader).unwrap();

        assert_eq!(loader.calls, 2);
        assert_eq!(seq.frame_count(), 2);
    }

    #[test]
    fn start_before_load_warns() {
        let mut seq = FrameSequencer::<String>::new(10, false);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();

        assert_eq!(
            seq.start(&mut sched, &mut surface),
            Err(SequencerError::NotLoaded)
        );
        assert!(!seq.is_playing());
        assert_eq!(surface.nodes_created(), 0);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn start_twice_warns_and_keeps_one_timer() {
        let mut seq = loaded(&["a", "b"], true);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();

        seq.start(&mut sched, &mut surface).unwrap();
        assert_eq!(
            seq.start(&mut sched, &mut surface),
            Err(SequencerError::AlreadyPlaying)
        );
        assert!(seq.is_playing());
        assert_eq!(sched.active(), 1);
    }

    #[test]
    fn start_shows_first_frame() {
        let mut seq = loaded(&["a", "b"], false);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();

        seq.start(&mut sched, &mut surface).unwrap();
        assert!(seq.is_playing());
        assert_eq!(seq.current_frame(), 0);
        assert_eq!(surface.visible_frame().map(String::as_str), Some("<a>"));
    }

    #[test]
    fn single_shot_finishes_once() {
        let mut seq = loaded(&["a", "b", "c"], false);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();
        seq.start(&mut sched, &mut surface).unwrap();

        let ticks = tick(&mut seq, &mut sched, &mut surface, Duration::from_secs(5));
        assert_eq!(
            ticks,
            vec![Playback::Advanced, Playback::Advanced, Playback::Finished]
        );
        assert!(!seq.is_playing());
        assert_eq!(sched.active(), 0);
        assert_eq!(surface.visible_frame().map(String::as_str), Some("<c>"));
        // one redraw from start plus one per tick
        assert_eq!(surface.redraws(), 4);
    }

    #[test]
    fn looping_wraps_to_first_frame() {
        let mut seq = loaded(&["a", "b"], true);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();
        seq.start(&mut sched, &mut surface).unwrap();

        let ticks = tick(&mut seq, &mut sched, &mut surface, Duration::from_millis(500));
        assert_eq!(ticks, vec![Playback::Advanced; 5]);
        assert!(seq.is_playing());
        assert_eq!(seq.current_frame(), 1);
        assert_eq!(surface.visible_frame().map(String::as_str), Some("<b>"));
    }

    #[test]
    fn restart_reuses_node_and_rewinds() {
        let mut seq = loaded(&["a", "b", "c"], true);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();

        seq.start(&mut sched, &mut surface).unwrap();
        tick(&mut seq, &mut sched, &mut surface, Duration::from_millis(100));
        assert_eq!(seq.current_frame(), 1);

        seq.stop(&mut sched);
        seq.stop(&mut sched);
        assert!(!seq.is_playing());

        seq.start(&mut sched, &mut surface).unwrap();
        assert_eq!(seq.current_frame(), 0);
        assert_eq!(surface.nodes_created(), 1);
        assert_eq!(surface.visible_frame().map(String::as_str), Some("<a>"));
    }

    #[test]
    fn foreign_timer_is_ignored() {
        let mut seq = loaded(&["a", "b"], true);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();
        let other = sched.after(Duration::from_millis(1));
        seq.start(&mut sched, &mut surface).unwrap();

        assert_eq!(seq.on_timer(other, &mut sched, &mut surface), None);
        assert_eq!(seq.current_frame(), 0);
    }

    #[test]
    fn destroy_returns_to_pre_load_state() {
        let mut seq = loaded(&["a", "b"], true);
        let mut sched = TimerQueue::new();
        let mut surface = FrameSurface::new();
        seq.start(&mut sched, &mut surface).unwrap();

        seq.destroy(&mut sched, &mut surface);
        assert!(!seq.is_playing());
        assert!(!seq.is_loaded());
        assert_eq!(seq.frame_count(), 0);
        assert_eq!(seq.node(), None);
        assert_eq!(surface.node_count(), 0);
        assert_eq!(sched.active(), 0);

        // destroying again is harmless
        seq.destroy(&mut sched, &mut surface);
        assert_eq!(
            seq.start(&mut sched, &mut surface),
            Err(SequencerError::NotLoaded)
        );
    }
}
