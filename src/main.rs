use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf, time::Duration};
use tracing::{info, warn};

use issuedeck::{
    app::InputMode,
    initial_fetch,
    logging::init_logging,
    services::{QueryCache, SqliteStore},
    ui, update,
    utils::open_url,
    App, Command, Config, FetchRequest, Launch, Message, Overrides, StateFilter, Tutorial,
    TutorialStore,
};

/// Browse, filter and learn to file GitHub issues from the terminal
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Repository to browse, as owner/name or a GitHub URL
    #[arg(long, env = "ISSUEDECK_REPO")]
    repo: Option<String>,

    /// GitHub token (falls back to `gh auth token`, then anonymous access)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to a config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Open the getting-started guide on launch, optionally at a step
    /// (welcome, signup, tour, creation, completion)
    #[arg(long, value_name = "STEP", num_args = 0..=1)]
    tutorial: Option<Option<String>>,

    /// Forget tutorial progress before starting
    #[arg(long)]
    reset_tutorial: bool,

    /// Clear cached API responses and exit
    #[arg(long)]
    clear_cache: bool,

    /// Log filter used when RUST_LOG is unset (e.g. debug, issuedeck=trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn launch(&self) -> Launch {
        match &self.tutorial {
            None => Launch::Auto,
            Some(None) => Launch::Resume,
            Some(Some(slug)) => Launch::At(slug.clone()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let launch = cli.launch();

    let config = Config::load(
        cli.config.as_deref(),
        Overrides {
            repo: cli.repo,
            token: cli.token,
            log_level: cli.log_level,
        },
    )?;

    let _log_guard = match init_logging(&config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    let cache_path = config
        .cache_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache path"))?;

    if cli.clear_cache {
        let removed = QueryCache::new(cache_path.clone()).clear()?;
        eprintln!(
            "Cleared {} cached responses from {}",
            removed,
            cache_path.display()
        );
        return Ok(());
    }

    let mut tutorial = Tutorial::load(TutorialStore::new(SqliteStore::new(cache_path)));
    tutorial.start(&launch, cli.reset_tutorial);

    let token = config.resolve_token();
    info!(repo = %config.repo, authenticated = token.is_some(), "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = App::new(config, token, tutorial).and_then(|mut app| {
        if let Some(cmd) = initial_fetch(&mut app) {
            handle_command(&mut app, cmd);
        }
        run_app(&mut terminal, &mut app)
    });

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(error = %err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Drain async fetch results
        while let Some(result) = app.check_fetch_result() {
            if let Some(cmd) = update(app, Message::FetchComplete(result)) {
                if handle_command(app, cmd) {
                    return Ok(());
                }
            }
        }

        // Periodic background refresh of the issue list
        if app.should_auto_refresh() {
            app.start_fetch(FetchRequest::Issues {
                state: app.filter.state,
                sort: app.filter.sort,
            });
        }

        // Update spinner
        if let Some(cmd) = update(app, Message::Tick) {
            if handle_command(app, cmd) {
                return Ok(());
            }
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(msg) = key_to_message(app, key.code, key.modifiers) {
                        if let Some(cmd) = update(app, msg) {
                            if handle_command(app, cmd) {
                                return Ok(());
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Handle a command returned from update. Returns true when the app should exit.
fn handle_command(app: &mut App, cmd: Command) -> bool {
    match cmd {
        Command::Quit => true,
        Command::StartFetch(request) => {
            app.start_fetch(request);
            false
        }
        Command::OpenUrl(url) => {
            if !open_url(&url) {
                warn!(url = %url, "no browser available");
                update(app, Message::ShowUrl(url));
            }
            false
        }
        Command::Batch(commands) => commands
            .into_iter()
            .fold(false, |quit, cmd| handle_command(app, cmd) || quit),
    }
}

/// Convert a key press to a message based on current app state
fn key_to_message(app: &App, key: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
    if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
        return Some(Message::Quit);
    }

    // Help popup - any key dismisses
    if app.show_help_popup {
        return Some(Message::DismissHelp);
    }

    // Error popup
    if app.show_error_popup {
        return match key {
            KeyCode::Char('r') => Some(Message::Refresh),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Some(Message::DismissError),
            _ => None,
        };
    }

    // URL popup (shown when no browser could be opened)
    if app.show_url_popup.is_some() {
        return match key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Some(Message::DismissUrl),
            _ => None,
        };
    }

    // Tutorial overlay
    if app.tutorial.state().is_open {
        return match key {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => Some(Message::TutorialNext),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::TutorialPrevious),
            KeyCode::Esc | KeyCode::Char('q') => Some(Message::CloseTutorial),
            KeyCode::Char('s') => Some(Message::TutorialSkip),
            KeyCode::Char('o') => Some(Message::TutorialOpenLink),
            KeyCode::Char('R') => Some(Message::ResetTutorial),
            KeyCode::Char(c @ '1'..='5') => c
                .to_digit(10)
                .map(|d| Message::TutorialGoTo(d as usize - 1)),
            _ => None,
        };
    }

    // Label picker
    if app.show_labels_popup {
        return match key {
            KeyCode::Esc => Some(Message::CloseLabelsPopup),
            KeyCode::Enter => Some(Message::ToggleSelectedLabel),
            KeyCode::Down | KeyCode::Tab => Some(Message::LabelsNext),
            KeyCode::Up | KeyCode::BackTab => Some(Message::LabelsPrevious),
            KeyCode::Backspace => Some(Message::LabelQueryBackspace),
            KeyCode::Char(c) => Some(Message::LabelQueryInput(c)),
            _ => None,
        };
    }

    // Issue detail view
    if app.show_detail {
        return match key {
            KeyCode::Esc | KeyCode::Char('q') => Some(Message::CloseDetail),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::DetailScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::DetailScrollUp),
            KeyCode::Char('o') => Some(Message::OpenSelected),
            KeyCode::Char('r') => Some(Message::Refresh),
            KeyCode::Char('?') => Some(Message::ToggleHelp),
            _ => None,
        };
    }

    match app.input_mode {
        InputMode::Search => {
            return match key {
                KeyCode::Esc => Some(Message::ExitSearchMode { clear: true }),
                KeyCode::Enter => Some(Message::ExitSearchMode { clear: false }),
                KeyCode::Backspace => Some(Message::SearchBackspace),
                KeyCode::Char(c) => Some(Message::SearchInput(c)),
                KeyCode::Down | KeyCode::Tab => Some(Message::NextItem),
                KeyCode::Up | KeyCode::BackTab => Some(Message::PreviousItem),
                _ => None,
            };
        }
        InputMode::Author => {
            return match key {
                KeyCode::Esc => Some(Message::ExitAuthorMode { apply: false }),
                KeyCode::Enter => Some(Message::ExitAuthorMode { apply: true }),
                KeyCode::Backspace => Some(Message::AuthorBackspace),
                KeyCode::Char(c) => Some(Message::AuthorInput(c)),
                _ => None,
            };
        }
        InputMode::Normal => {}
    }

    // Normal mode
    match key {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Char('/') => Some(Message::EnterSearchMode),
        KeyCode::Esc => {
            if !app.filter.search.is_empty() {
                Some(Message::ExitSearchMode { clear: true })
            } else {
                None
            }
        }
        KeyCode::Char('j') | KeyCode::Down => Some(Message::NextItem),
        KeyCode::Char('k') | KeyCode::Up => Some(Message::PreviousItem),
        KeyCode::Char('g') => Some(Message::GoToTop),
        KeyCode::Char('G') => Some(Message::GoToBottom),
        KeyCode::Enter => Some(Message::OpenDetail),
        KeyCode::Char('o') => Some(Message::OpenSelected),
        KeyCode::Char('n') => Some(Message::NewIssue),
        KeyCode::Char('r') => Some(Message::Refresh),
        KeyCode::Char('a') => Some(Message::EnterAuthorMode),
        KeyCode::Char('A') => Some(Message::FilterBySelectedAuthor),
        KeyCode::Char('l') => Some(Message::OpenLabelsPopup),
        KeyCode::Char('s') => Some(Message::CycleSort),
        KeyCode::Char('x') => Some(Message::ClearFilters),
        KeyCode::Char('t') => Some(Message::OpenTutorial),
        KeyCode::Char('?') => Some(Message::ToggleHelp),
        KeyCode::Char('1') => Some(Message::SetStateFilter(StateFilter::All)),
        KeyCode::Char('2') => Some(Message::SetStateFilter(StateFilter::Open)),
        KeyCode::Char('3') => Some(Message::SetStateFilter(StateFilter::Closed)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuedeck::services::MemoryStore;
    use issuedeck::tutorial::StepId;

    fn launch_for(args: &[&str]) -> Launch {
        let argv = std::iter::once("issuedeck").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().launch()
    }

    #[test]
    fn tutorial_flag_forms() {
        assert_eq!(launch_for(&[]), Launch::Auto);
        assert_eq!(launch_for(&["--tutorial"]), Launch::Resume);
        assert_eq!(
            launch_for(&["--tutorial", "signup"]),
            Launch::At("signup".to_string())
        );
        assert_eq!(
            launch_for(&["--tutorial=creation", "--reset-tutorial"]),
            Launch::At("creation".to_string())
        );
    }

    #[test]
    fn tutorial_step_from_the_command_line_is_opened() {
        let cli = Cli::try_parse_from(["issuedeck", "--tutorial", "creation"]).unwrap();
        let mut tutorial = Tutorial::load(TutorialStore::new(MemoryStore::new()));
        tutorial.start(&cli.launch(), cli.reset_tutorial);
        assert!(tutorial.state().is_open);
        assert_eq!(tutorial.state().step().id, StepId::Creation);

        let cli = Cli::try_parse_from(["issuedeck", "--tutorial", "bogus"]).unwrap();
        tutorial.start(&cli.launch(), cli.reset_tutorial);
        assert_eq!(tutorial.state().step().id, StepId::Welcome);
    }
}
