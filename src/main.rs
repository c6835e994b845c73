pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use signbeat::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    conveyor::CONVEYOR_TICK,
    device::DeviceClass,
    engine::{Engine, EngineOutput, RoundEvent},
    evaluation::{ClassifierResponse, ClassifierWorker, ModelClassifier, Verdict},
    landmarks::LandmarkBuffer,
    logging,
    rating_flash::RatingFlash,
    results::{ResultsLog, RoundResult},
    round_clock::ROUND_TICK,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    signer::{sign_for_key, Autoplayer, KeySigner, SignModel},
    song::{Song, SongLibrary},
    util::format_time,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

/// How often the simulated player gets the sign right
const AUTOPLAY_ACCURACY: f64 = 0.85;

/// hand-sign rhythm game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Sign along to a song: cues slide toward the perfect zone and you make each hand sign before it arrives. Without a camera, letter keys fingerspell and 1/2/3 sign the phrases."
)]
pub struct Cli {
    /// id of the bundled song to play
    #[clap(short = 's', long)]
    song: Option<String>,

    /// play a song from a JSON file instead of a bundled one
    #[clap(short = 'f', long, conflicts_with = "song")]
    song_file: Option<PathBuf>,

    /// device class controlling conveyor geometry
    #[clap(short = 'd', long, value_enum)]
    device: Option<DeviceClass>,

    /// list the bundled songs and exit
    #[clap(short = 'l', long)]
    list: bool,

    /// let a simulated player do the signing
    #[clap(long)]
    autoplay: bool,

    /// persist --song and --device as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer the command line over the stored config
    fn apply_to(&self, config: &Config) -> Config {
        let mut merged = config.clone();
        if let Some(song) = &self.song {
            merged.default_song = song.clone();
        }
        if let Some(device) = self.device {
            merged.device = Some(device);
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub final_score: u32,
    pub song_title: String,
    pub best: Option<u32>,
}

#[derive(Debug)]
pub struct App {
    pub song: Song,
    pub config: Config,
    pub engine: Engine,
    pub flash: RatingFlash,
    pub state: AppState,
    pub summary: Option<RoundSummary>,
    pub signer: KeySigner,
    /// What the camera sees, read by the classifier worker
    pub landmarks: LandmarkBuffer,
    pub autoplayer: Option<Autoplayer>,
    pub results: Option<ResultsLog>,
    /// Time of the last event handled, used for rendering
    pub now: Instant,
}

impl App {
    pub fn new(
        song: Song,
        config: Config,
        device: DeviceClass,
        results: Option<ResultsLog>,
        autoplayer: Option<Autoplayer>,
    ) -> Self {
        Self {
            engine: Engine::new(&song, device, 1),
            song,
            config,
            flash: RatingFlash::new(),
            state: AppState::Playing,
            summary: None,
            signer: KeySigner::new(),
            landmarks: LandmarkBuffer::new(),
            autoplayer,
            results,
            now: Instant::now(),
        }
    }

    /// Fresh engine for the same song. Late classifier answers for the old
    /// round carry its number and get discarded.
    pub fn restart(&mut self) {
        self.engine.teardown();
        let round = self.engine.round() + 1;
        self.engine = Engine::new(&self.song, self.engine.device(), round);
        self.flash = RatingFlash::new();
        self.state = AppState::Playing;
        self.summary = None;
    }

    pub fn start_round(&mut self, now: Instant) -> Vec<EngineOutput> {
        let before = self.engine.current_entry_index();
        let outputs = self.engine.start(now);
        self.observe(before, now);
        outputs
    }

    pub fn on_round_tick(&mut self) -> Vec<EngineOutput> {
        self.engine.on_round_tick()
    }

    pub fn on_conveyor_tick(&mut self, now: Instant) -> Vec<EngineOutput> {
        let before = self.engine.current_entry_index();
        let outputs = self.engine.on_conveyor_tick(now);
        self.observe(before, now);
        if let Some(player) = self.autoplayer.as_mut() {
            player.poll(&self.signer, now);
        }
        self.capture(now);
        outputs
    }

    pub fn on_classified(&mut self, response: &ClassifierResponse, now: Instant) -> Verdict {
        let verdict = self.engine.on_classification(response);
        self.observe(self.engine.current_entry_index(), now);
        verdict
    }

    /// A key was pressed while playing. True if it made a sign.
    pub fn on_sign_key(&mut self, c: char, now: Instant) -> bool {
        if self.autoplayer.is_some() {
            return false;
        }
        match sign_for_key(c) {
            Some(sign) => {
                self.signer.press(sign, now);
                self.capture(now);
                true
            }
            None => false,
        }
    }

    /// Show the camera whatever hand is up at `now`.
    fn capture(&self, now: Instant) {
        match self.signer.capture(now) {
            Some(frame) => self.landmarks.publish(frame),
            None => self.landmarks.clear(),
        }
    }

    pub fn finish(&mut self, final_score: u32, song_title: String) {
        let mut best = None;
        if self.config.save_results {
            if let Some(log) = &self.results {
                let result = RoundResult::new(
                    self.engine.song_id(),
                    &song_title,
                    self.engine.device(),
                    final_score,
                );
                if let Err(e) = log.append(&result) {
                    log::warn!("could not save results to {}: {e}", log.path().display());
                }
                best = log.best_score(self.engine.song_id()).ok().flatten();
            }
        }
        self.summary = Some(RoundSummary {
            final_score,
            song_title,
            best,
        });
        self.state = AppState::Results;
    }

    fn observe(&mut self, before: Option<usize>, now: Instant) {
        self.now = now;
        let state = self.engine.state();
        self.flash
            .observe(state.current_rating, state.rating_event, now);

        let current = self.engine.current_entry_index();
        if current == before {
            return;
        }
        // a sign only counts toward the entry it was made for
        self.signer.release();
        if let (Some(index), Some(player)) = (current, self.autoplayer.as_mut()) {
            if let Some(entry) = self.song.entries.get(index) {
                player.on_entry(
                    &entry.expected_sign,
                    Duration::from_millis(entry.duration_ms),
                    now,
                );
            }
        }
    }
}

fn load_song(cli: &Cli, config: &Config) -> Result<Song, Box<dyn Error>> {
    let mut song = match &cli.song_file {
        Some(path) => Song::from_path(path)?,
        None => {
            let library = SongLibrary::bundled()?;
            match library.get(&config.default_song) {
                Some(song) => song.clone(),
                None => {
                    log::warn!("no song named {}, playing silence", config.default_song);
                    Song::placeholder(&config.default_song)
                }
            }
        }
    };
    if let Some(difficulty) = config.difficulty {
        song.difficulty = difficulty;
    }
    if song.choreography_ms() > song.duration_ms.max(0) as u64 {
        log::warn!(
            "{} has {}ms of entries but ends after {}ms",
            song.id,
            song.choreography_ms(),
            song.duration_ms
        );
    }
    Ok(song)
}

fn list_songs() -> Result<(), Box<dyn Error>> {
    let library = SongLibrary::bundled()?;
    for song in library.songs() {
        println!(
            "{:<12} {:<28} {:<8} {}",
            song.id,
            song.title,
            song.difficulty.to_string(),
            format_time(song.duration_ms)
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list {
        return list_songs();
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(&store.load());

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path, config.log_filter()) {
            eprintln!("logging disabled: {e}");
        }
    }

    if cli.save_config {
        store.save(&config)?;
        log::info!("saved config to {}", store.path().display());
    }

    let song = load_song(&cli, &config)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let device = config.resolve_device(terminal::size().ok().map(|(columns, _)| columns));
    log::info!("playing on {device} geometry");

    let autoplayer = cli.autoplay.then(|| Autoplayer::new(AUTOPLAY_ACCURACY));
    let results = ResultsLog::open_default();
    let mut app = App::new(song, config, device, results, autoplayer);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

#[derive(Debug)]
enum ExitType {
    Restart,
    Quit,
}

fn classifier_latency(app: &App) -> Duration {
    if app.autoplayer.is_some() {
        Duration::from_millis(rand::thread_rng().gen_range(40..200))
    } else {
        Duration::ZERO
    }
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let responses = events.sender();
    let mut runner = Runner::new(
        events,
        FixedTicker::new(ROUND_TICK),
        FixedTicker::new(CONVEYOR_TICK),
    );

    let model = SignModel::new();

    loop {
        let mut exit_type = ExitType::Quit;

        let round_model = model.clone();
        let classifier = ModelClassifier::new(move |input: &[f32]| {
            round_model.predict(input).map(str::to_string)
        })
        .with_latency(classifier_latency(app));
        let worker = ClassifierWorker::spawn(classifier, app.landmarks.clone(), responses.clone())?;

        let now = Instant::now();
        runner.reset(now);
        let outputs = app.start_round(now);
        handle_outputs(app, outputs, &worker);
        terminal.draw(|f| ui(app, f))?;

        loop {
            match runner.step() {
                GameEvent::RoundTick => {
                    let outputs = app.on_round_tick();
                    handle_outputs(app, outputs, &worker);
                    terminal.draw(|f| ui(app, f))?;
                }
                GameEvent::ConveyorTick => {
                    if app.state == AppState::Playing {
                        let outputs = app.on_conveyor_tick(Instant::now());
                        handle_outputs(app, outputs, &worker);
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                GameEvent::Classified(response) => {
                    app.on_classified(&response, Instant::now());
                }
                GameEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                GameEvent::Key(key) => {
                    match key.code {
                        KeyCode::Esc => {
                            break;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break;
                        }
                        KeyCode::Char(c) => match app.state {
                            AppState::Playing => {
                                app.on_sign_key(c, Instant::now());
                            }
                            AppState::Results => {
                                if c == 'r' {
                                    exit_type = ExitType::Restart;
                                    break;
                                }
                            }
                        },
                        _ => {}
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        app.engine.teardown();
        worker.shutdown();

        match exit_type {
            ExitType::Restart => app.restart(),
            ExitType::Quit => break,
        }
    }

    Ok(())
}

fn handle_outputs(app: &mut App, outputs: Vec<EngineOutput>, worker: &ClassifierWorker) {
    for output in outputs {
        match output {
            EngineOutput::Position(_) => {}
            EngineOutput::Classify(ticket) => {
                if !worker.request(ticket) {
                    log::warn!("classifier worker has stopped");
                }
            }
            EngineOutput::Round(RoundEvent::EntriesComplete) => {
                log::debug!("all entries played, waiting for the song to end");
            }
            EngineOutput::Round(RoundEvent::Ended {
                final_score,
                song_title,
            }) => app.finish(final_score, song_title),
        }
    }
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}
