//! Minigame session controller.
//!
//! Drives one timed division challenge:
//!
//! ```text
//! Intro --(intro done | load failed | choose)--> Choice
//! Choice --Play--> Active --(time up)--> Results --acknowledge--> Finished
//! Choice --Skip--> Closing --(settle delay)--> Finished
//! any --cleanup--> Destroyed (or stays Finished)
//! ```
//!
//! Every timer the controller starts is kept as a [`TimerId`] field and
//! cancelled on the transition that ends its purpose. Handles that fire after
//! being cancelled no longer match a field and are dropped.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::error::SessionError;
use crate::input::{Choice, SessionInput};
use crate::loader::{EmbeddedFrames, FrameLoader};
use crate::problem::{self, Problem};
use crate::scheduler::{Scheduler, TimerId};
use crate::sequencer::{FrameSequencer, Playback};
use crate::shuffle::{ShuffleBudget, DEFAULT_SHUFFLES};
use crate::surface::Surface;

pub const MAX_INPUT_LEN: usize = 5;
pub const COUNTDOWN_PERIOD: Duration = Duration::from_millis(1000);
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(800);
pub const SKIP_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    Intro,
    Choice,
    Active,
    /// Time ran out; tallies are final and wait to be acknowledged.
    Results,
    /// Skip was chosen; the result goes out after the settle delay.
    Closing,
    Finished,
    /// Torn down before finishing. The completion callback never fires.
    Destroyed,
}

/// Cross-cutting settings handed to the session instead of read from globals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self { volume: 0.5 }
    }
}

impl Settings {
    pub fn is_muted(&self) -> bool {
        self.volume <= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub shuffle_budget: u32,
    pub frame_rate: i32,
    pub loop_intro: bool,
    pub intro_frames: Vec<String>,
    pub feedback_delay: Duration,
    pub skip_delay: Duration,
    pub seed: Option<u64>,
    pub settings: Settings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            shuffle_budget: DEFAULT_SHUFFLES,
            frame_rate: 8,
            loop_intro: false,
            intro_frames: EmbeddedFrames::intro_ids(),
            feedback_delay: FEEDBACK_DELAY,
            skip_delay: SKIP_DELAY,
            seed: None,
            settings: Settings::default(),
        }
    }
}

/// A wrong answer, kept verbatim for the results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: u32,
}

/// The single outcome handed to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub correct_answers: u32,
    pub total_problems: u32,
    pub time_remaining: u32,
    pub skipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong { expected: u32 },
}

pub type OnComplete = Box<dyn FnOnce(SessionResult)>;

pub struct Session<S, V, L>
where
    S: Scheduler,
    V: Surface,
    L: FrameLoader<Frame = V::Frame>,
{
    config: SessionConfig,
    scheduler: S,
    surface: V,
    loader: L,
    sequencer: FrameSequencer<V::Frame>,
    rng: StdRng,
    phase: Phase,
    time_remaining: u32,
    correct_answers: u32,
    total_problems: u32,
    user_input: String,
    shuffles: ShuffleBudget,
    mistakes: Vec<Mistake>,
    problem: Option<Problem>,
    feedback: Option<Feedback>,
    countdown: Option<TimerId>,
    feedback_timer: Option<TimerId>,
    close_timer: Option<TimerId>,
    listening: bool,
    begun: bool,
    outcome: Option<SessionResult>,
    on_complete: Option<OnComplete>,
}

impl<S, V, L> Session<S, V, L>
where
    S: Scheduler,
    V: Surface,
    L: FrameLoader<Frame = V::Frame>,
{
    pub fn new(
        config: SessionConfig,
        scheduler: S,
        surface: V,
        loader: L,
        on_complete: impl FnOnce(SessionResult) + 'static,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sequencer: FrameSequencer::new(config.frame_rate, config.loop_intro),
            time_remaining: config.duration_secs,
            shuffles: ShuffleBudget::new(config.shuffle_budget),
            config,
            scheduler,
            surface,
            loader,
            rng,
            phase: Phase::Intro,
            correct_answers: 0,
            total_problems: 0,
            user_input: String::new(),
            mistakes: Vec::new(),
            problem: None,
            feedback: None,
            countdown: None,
            feedback_timer: None,
            close_timer: None,
            listening: false,
            begun: false,
            outcome: None,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Load and start the intro. A failed load is not fatal: the session goes
    /// straight to the choice.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        self.expect_phase("begin", &[Phase::Intro])?;
        if self.begun {
            let err = SessionError::WrongPhase {
                op: "begin",
                phase: self.phase,
            };
            warn!(error = %err, "Intro already started");
            return Err(err);
        }
        self.begun = true;

        if let Err(err) = self
            .sequencer
            .load(self.config.intro_frames.as_slice(), &mut self.loader)
        {
            warn!(error = %err, "Intro animation unavailable, skipping to choice");
            self.enter_choice();
            return Ok(());
        }
        if let Err(err) = self.sequencer.start(&mut self.scheduler, &mut self.surface) {
            warn!(error = %err, "Intro did not start, skipping to choice");
            self.enter_choice();
        }
        Ok(())
    }

    /// Advance the scheduler's clock, dispatching every timer that falls due
    /// in deadline order.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;
        while let Some(id) = self.scheduler.pop_due(until) {
            self.on_timer(id);
        }
    }

    /// Route a fired timer to whichever part of the session owns it.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.countdown == Some(id) {
            self.tick_countdown();
        } else if self.feedback_timer == Some(id) {
            self.feedback_elapsed();
        } else if self.close_timer == Some(id) {
            self.close_timer = None;
            self.finish();
        } else if let Some(playback) =
            self.sequencer
                .on_timer(id, &mut self.scheduler, &mut self.surface)
        {
            if playback == Playback::Finished && self.phase == Phase::Intro {
                self.enter_choice();
            }
        } else {
            trace!(?id, "Stale timer ignored");
        }
    }

    /// Play or skip. Also accepted during the intro, which is cut short.
    pub fn choose(&mut self, choice: Choice) -> Result<(), SessionError> {
        self.expect_phase("choose", &[Phase::Intro, Phase::Choice])?;
        if self.phase == Phase::Intro {
            self.enter_choice();
        }

        match choice {
            Choice::Play => self.play(),
            Choice::Skip => self.skip(),
        }
        Ok(())
    }

    /// Feed one input event. Only accepted while the countdown is running.
    pub fn input(&mut self, input: SessionInput) -> Result<(), SessionError> {
        if !self.accepts_input() {
            warn!(?input, phase = %self.phase, "Input ignored");
            return Err(SessionError::InputClosed);
        }

        match input {
            SessionInput::Digit(c) => {
                if c.is_ascii_digit() && self.user_input.len() < MAX_INPUT_LEN {
                    self.user_input.push(c);
                }
            }
            SessionInput::Delete => {
                self.user_input.pop();
            }
            SessionInput::Submit => {
                if !self.user_input.is_empty() {
                    self.check_answer();
                }
            }
            SessionInput::Shuffle => self.shuffle(),
        }
        Ok(())
    }

    /// Close the results summary and deliver the result.
    pub fn acknowledge(&mut self) -> Result<(), SessionError> {
        self.expect_phase("acknowledge", &[Phase::Results])?;
        self.finish();
        Ok(())
    }

    /// Release every timer and the sequencer, whatever the phase. Idempotent.
    /// A session torn down before finishing never calls its callback.
    pub fn cleanup(&mut self) {
        self.release();
        if self.phase != Phase::Finished && self.phase != Phase::Destroyed {
            debug!(phase = %self.phase, "Session destroyed");
            self.phase = Phase::Destroyed;
        }
        self.on_complete = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Active && self.countdown.is_some() && self.listening
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn total_problems(&self) -> u32 {
        self.total_problems
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    pub fn shuffles_remaining(&self) -> u32 {
        self.shuffles.remaining()
    }

    /// Final tallies once the session has decided its result.
    pub fn summary(&self) -> Option<&SessionResult> {
        self.outcome.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &FrameSequencer<V::Frame> {
        &self.sequencer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut V {
        &mut self.surface
    }

    fn expect_phase(&self, op: &'static str, allowed: &[Phase]) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        let err = SessionError::WrongPhase {
            op,
            phase: self.phase,
        };
        warn!(error = %err, "State violation");
        Err(err)
    }

    fn enter_choice(&mut self) {
        self.sequencer.stop(&mut self.scheduler);
        self.phase = Phase::Choice;
        debug!("Waiting for play or skip");
    }

    fn play(&mut self) {
        self.sequencer.destroy(&mut self.scheduler, &mut self.surface);
        self.time_remaining = self.config.duration_secs;
        self.next_problem();
        if self.time_remaining == 0 {
            self.expire();
            return;
        }
        self.countdown = Some(self.scheduler.every(COUNTDOWN_PERIOD));
        self.listening = true;
        self.phase = Phase::Active;
        info!(secs = self.time_remaining, "Session started");
    }

    fn skip(&mut self) {
        self.correct_answers = 0;
        self.sequencer.stop(&mut self.scheduler);
        self.listening = false;
        self.outcome = Some(SessionResult {
            correct_answers: 0,
            total_problems: self.total_problems,
            time_remaining: self.time_remaining,
            skipped: true,
        });
        self.close_timer = Some(self.scheduler.after(self.config.skip_delay));
        self.phase = Phase::Closing;
        info!("Session skipped");
    }

    fn tick_countdown(&mut self) {
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.expire();
        }
    }

    fn expire(&mut self) {
        self.cancel_timers();
        self.listening = false;
        self.feedback = None;
        self.outcome = Some(SessionResult {
            correct_answers: self.correct_answers,
            total_problems: self.total_problems,
            time_remaining: 0,
            skipped: false,
        });
        self.phase = Phase::Results;
        info!(
            correct = self.correct_answers,
            total = self.total_problems,
            mistakes = self.mistakes.len(),
            "Time up"
        );
    }

    fn check_answer(&mut self) {
        let Some(problem) = self.problem.as_ref() else {
            return;
        };
        let guess = std::mem::take(&mut self.user_input);
        self.total_problems += 1;

        if problem.check(&guess) {
            self.correct_answers += 1;
            self.feedback = Some(Feedback::Correct);
        } else {
            self.feedback = Some(Feedback::Wrong {
                expected: problem.answer,
            });
            self.mistakes.push(Mistake {
                question: problem.question.clone(),
                user_answer: guess,
                correct_answer: problem.answer,
            });
        }
        debug!(
            correct = self.correct_answers,
            total = self.total_problems,
            "Answer checked"
        );

        // a newer answer restarts the display window
        if let Some(old) = self.feedback_timer.take() {
            self.scheduler.cancel(old);
        }
        self.feedback_timer = Some(self.scheduler.after(self.config.feedback_delay));
    }

    fn feedback_elapsed(&mut self) {
        self.feedback_timer = None;
        self.feedback = None;
        if self.phase == Phase::Active {
            self.next_problem();
        }
    }

    fn shuffle(&mut self) {
        if !self.shuffles.consume() {
            debug!("Shuffle budget exhausted");
            return;
        }
        self.next_problem();
        self.feedback = None;
        debug!(remaining = self.shuffles.remaining(), "Problem shuffled");
    }

    fn next_problem(&mut self) {
        self.problem = Some(problem::generate(&mut self.rng));
    }

    fn finish(&mut self) {
        self.release();
        self.phase = Phase::Finished;
        if let (Some(callback), Some(result)) = (self.on_complete.take(), self.outcome) {
            info!(?result, "Session finished");
            callback(result);
        }
    }

    fn cancel_timers(&mut self) {
        for timer in [
            self.countdown.take(),
            self.feedback_timer.take(),
            self.close_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(timer);
        }
    }

    fn release(&mut self) {
        self.cancel_timers();
        self.sequencer.destroy(&mut self.scheduler, &mut self.surface);
        self.listening = false;
    }
}

impl<S, V, L> Drop for Session<S, V, L>
where
    S: Scheduler,
    V: Surface,
    L: FrameLoader<Frame = V::Frame>,
{
    fn drop(&mut self) {
        self.cleanup();
    }
}
