mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use divvy::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{History, HistoryRecord},
    input::{self, Command},
    loader::IntroSource,
    runtime::{CrosstermEventSource, FixedTicker, HostEvent, Runner},
    scheduler::TimerQueue,
    session::{Phase, Session, SessionResult},
    surface::FrameSurface,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cell::RefCell,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;

/// timed division minigame: an intro, a countdown and three free shuffles
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Solve as many divisions as you can before the clock runs out. Tab shuffles the current problem a limited number of times; skipping scores zero."
)]
pub struct Cli {
    /// number of seconds on the clock
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// number of free shuffles per session
    #[clap(long)]
    shuffles: Option<u32>,

    /// intro animation frame rate (values below 1 play at 1 fps)
    #[clap(long, allow_negative_numbers = true)]
    fps: Option<i32>,

    /// loop the intro until play or skip is chosen
    #[clap(long)]
    loop_intro: bool,

    /// directory of .txt intro frames to use instead of the bundled ones
    #[clap(short = 'f', long)]
    frames: Option<PathBuf>,

    /// seed for the problem generator
    #[clap(long)]
    seed: Option<u64>,

    /// feedback volume between 0 and 1 (0 mutes the wrong-answer bell)
    #[clap(long)]
    volume: Option<f32>,

    /// store the given options as the new defaults
    #[clap(long)]
    save: bool,
}

impl Cli {
    /// Overlay the flags given on the command line onto stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.secs {
            cfg.duration_secs = secs;
        }
        if let Some(shuffles) = self.shuffles {
            cfg.shuffle_budget = shuffles;
        }
        if let Some(fps) = self.fps {
            cfg.frame_rate = fps;
        }
        if let Some(ref frames) = self.frames {
            cfg.frames_dir = Some(frames.clone());
        }
        if let Some(volume) = self.volume {
            cfg.volume = volume;
        }
        cfg.loop_intro |= self.loop_intro;
        cfg
    }
}

pub type TuiSession = Session<TimerQueue, FrameSurface<String>, IntroSource>;

pub struct App {
    pub config: Config,
    pub seed: Option<u64>,
    pub session: TuiSession,
    pub last_result: Option<SessionResult>,
    pub last_record: Option<HistoryRecord>,
    pub best: Option<u32>,
    delivered: Rc<RefCell<Option<SessionResult>>>,
    history: Option<History>,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>, history: Option<History>) -> Self {
        let delivered = Rc::new(RefCell::new(None));
        let best = history.as_ref().and_then(History::best);
        Self {
            session: new_session(&config, seed, &delivered),
            config,
            seed,
            last_result: None,
            last_record: None,
            best,
            delivered,
            history,
        }
    }

    pub fn restart(&mut self) {
        self.session.cleanup();
        self.session = new_session(&self.config, self.seed, &self.delivered);
        self.last_result = None;
        self.last_record = None;
    }

    /// Apply a command. Returns true when the wrong-answer bell should ring.
    pub fn apply(&mut self, cmd: Command) -> bool {
        let mut bell = false;
        match cmd {
            Command::Choose(choice) => {
                let _ = self.session.choose(choice);
            }
            Command::Input(input) => {
                let mistakes = self.session.mistakes().len();
                let _ = self.session.input(input);
                bell = self.session.mistakes().len() > mistakes
                    && !self.session.settings().is_muted();
            }
            Command::Acknowledge => {
                let _ = self.session.acknowledge();
            }
            Command::Restart => self.restart(),
            Command::Quit => {}
        }
        self.collect_result();
        bell
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.session.advance(elapsed);
        self.collect_result();
    }

    fn collect_result(&mut self) {
        let delivered = self.delivered.borrow_mut().take();
        let Some(result) = delivered else {
            return;
        };
        self.last_result = Some(result);

        let record = HistoryRecord::new(
            &result,
            self.session.config().duration_secs,
            self.session.mistakes().len(),
        );
        if let Some(ref history) = self.history {
            if let Err(e) = history.append(&record) {
                tracing::warn!(error = %e, "Failed to record session");
            }
            self.best = history.best();
        }
        self.last_record = Some(record);
    }
}

fn new_session(
    config: &Config,
    seed: Option<u64>,
    delivered: &Rc<RefCell<Option<SessionResult>>>,
) -> TuiSession {
    let source = config.intro_source();
    let session_config = config.session_config(&source, seed);
    let sink = Rc::clone(delivered);
    let mut session = Session::new(
        session_config,
        TimerQueue::new(),
        FrameSurface::new(),
        source,
        move |result| *sink.borrow_mut() = Some(result),
    );
    // only fails outside Intro, and a new session is always in Intro
    let _ = session.begin();
    session
}

fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    // the terminal belongs to the TUI, so logs only ever go to the file
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save {
        store.save(&config)?;
    }
    let history = AppDirs::history_path().map(History::new);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cli.seed, history);
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            HostEvent::Tick(elapsed) => {
                let before = (app.session.phase(), app.session.time_remaining());
                app.on_tick(elapsed);
                let changed = before != (app.session.phase(), app.session.time_remaining());

                if app.session.surface_mut().take_redraw()
                    || changed
                    || app.session.phase() == Phase::Active
                {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            HostEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            HostEvent::Key(key) => {
                // keep timers moving while keys arrive faster than the tick rate
                app.on_tick(runner.take_elapsed());

                match input::command_for(app.session.phase(), key) {
                    Some(Command::Quit) => break,
                    Some(cmd) => {
                        if app.apply(cmd) {
                            print!("\x07");
                            io::stdout().flush()?;
                        }
                    }
                    None => {}
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    app.session.cleanup();
    Ok(())
}
