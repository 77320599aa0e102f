mod api;
mod app;
mod config;
mod delimited;
mod filter;
mod form;
mod logging;
mod model;
mod store;
mod translate;
mod ui;
mod view;
mod worker;

use api::{AnyBackend, Backend, DelimitedSource, HttpBackend, Location};
use app::{AdminFocus, App, Dialog, InputMode, View};
use clap::{Parser, Subcommand};
use config::Config;
use filter::Query;
use model::ErrorRecord;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use translate::Translations;
use ui::backdrop::{Backdrop, TorusKnotBackdrop};
use worker::WorkerChannels;

/// TUI explorer and editor for machine error code catalogs
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the error code service
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// JSON file mapping source-language strings to display strings
    #[arg(short, long, global = true)]
    translations: Option<PathBuf>,

    /// Admin password (skips the login prompt)
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Configuration file (defaults to the per-user config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hide the animated banner
    #[arg(long, global = true)]
    no_banner: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and search the catalog (default)
    View {
        /// Semicolon-delimited catalog file or URL instead of the API
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Open the admin view directly
    Admin,
    /// Write the catalog in semicolon-delimited form
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Semicolon-delimited catalog file or URL instead of the API
        #[arg(short, long)]
        source: Option<String>,

        /// Only export codes matching this search text
        #[arg(long)]
        search: Option<String>,

        /// Only export codes tagged with this platform
        #[arg(long)]
        platform: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url.clone() {
        config.base_url = url;
    }
    if let Some(path) = cli.translations.clone() {
        config.translations = Some(path);
    }
    if cli.no_banner {
        config.banner = false;
    }

    // Normalize command
    let command = cli.command.unwrap_or(Commands::View { source: None });
    let stderr_level = match &command {
        Commands::Export { .. } => Some("warn"),
        _ => None,
    };
    let project_dirs = config::project_dirs()?;
    let _log_guard = logging::init(
        &logging::log_dir(project_dirs.data_dir()),
        &config.log_filter,
        stderr_level,
    )?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

    match command {
        Commands::Export {
            output,
            source,
            search,
            platform,
        } => {
            if let Some(source) = source {
                config.source = Some(source);
            }
            let backend = build_backend(&config)?;
            let query = Query {
                text: search.unwrap_or_default(),
                platform,
            };
            let translations = load_translations(&config);
            export(&backend, &query, translations.as_ref(), &output).await?;
        }
        Commands::View { source } => {
            if let Some(source) = source {
                config.source = Some(source);
            }
            let backend = build_backend(&config)?;
            let mut app = App::new(load_translations(&config), backend.writable());
            app.target = backend_target(&config);
            if let Some(password) = cli.password {
                if !backend.writable() {
                    eprintln!("Warning: the catalog source is read-only; --password ignored");
                }
                pre_login(&backend, &mut app, &password).await?;
                app.view = View::Catalog;
            }
            run(backend, app, &config).await?;
        }
        Commands::Admin => {
            if config.source.is_some() {
                eprintln!("Error: the admin view needs the REST API; remove `source` from the configuration");
                std::process::exit(1);
            }
            let backend = build_backend(&config)?;
            let mut app = App::new(load_translations(&config), true);
            app.target = backend_target(&config);
            let password = match cli.password {
                Some(p) => p,
                None => rpassword::prompt_password("Admin password: ")?,
            };
            pre_login(&backend, &mut app, &password).await?;
            run(backend, app, &config).await?;
        }
    }

    Ok(())
}

fn build_backend(config: &Config) -> Result<AnyBackend, Box<dyn std::error::Error>> {
    let timeout = config.request_timeout();
    let backend = match &config.source {
        Some(source) => {
            let location = Location::parse(source);
            tracing::info!(%location, "using delimited catalog");
            AnyBackend::Delimited(DelimitedSource::new(location, timeout)?)
        }
        None => {
            tracing::info!(base_url = %config.base_url, "using REST catalog");
            AnyBackend::Http(HttpBackend::new(&config.base_url, timeout)?)
        }
    };
    Ok(backend)
}

/// Where the catalog comes from, as shown in the login prompt.
fn backend_target(config: &Config) -> String {
    match &config.source {
        Some(source) => Location::parse(source).to_string(),
        None => config.base_url.clone(),
    }
}

/// A broken translation file degrades to untranslated display.
fn load_translations(config: &Config) -> Option<Translations> {
    let path = config.translations.as_ref()?;
    match Translations::load(path) {
        Ok(t) => {
            tracing::info!(path = %path.display(), entries = t.len(), "translations loaded");
            Some(t)
        }
        Err(e) => {
            tracing::warn!(error = %e, "translations unavailable");
            eprintln!("Warning: {}", e);
            None
        }
    }
}

async fn pre_login(backend: &AnyBackend, app: &mut App, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.pre_login(backend, password)
        .await
        .map_err(|e| e.user_message().into())
}

async fn export(
    backend: &AnyBackend,
    query: &Query,
    translations: Option<&Translations>,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message("Fetching error codes...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let records = store::fetch(backend).await?;
    let mut selected: Vec<ErrorRecord> = filter::filter(&records, query, translations)
        .into_iter()
        .cloned()
        .collect();
    selected.sort_by(|a, b| model::compare_codes(&a.code, &b.code));
    spinner.set_message(format!("Writing {} of {} error codes...", selected.len(), records.len()));
    let text = delimited::render(&selected)?;
    tokio::fs::write(output, text).await?;

    spinner.finish_with_message(format!("Exported {} error codes to {}", selected.len(), output.display()));
    tracing::info!(count = selected.len(), total = records.len(), output = %output.display(), "catalog exported");
    Ok(())
}

async fn run(backend: AnyBackend, mut app: App, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Arc::new(backend);
    let channels = WorkerChannels::new();
    let backdrop = config.banner.then(TorusKnotBackdrop::new);

    app.init();

    // Init terminal
    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    app.update_page_size(size.height);

    let result = run_app(&mut terminal, &mut app, &backend, &channels, backdrop.as_ref());

    // Restore terminal
    ratatui::restore();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if app.authenticated {
        if let Err(e) = backend.logout().await {
            tracing::debug!(error = %e, "logout on exit failed");
        }
    }
    Ok(())
}

fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    backend: &Arc<AnyBackend>,
    channels: &WorkerChannels,
    backdrop: Option<&TorusKnotBackdrop>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for request in app.take_requests() {
            worker::spawn(Arc::clone(backend), request, channels.response_tx.clone());
        }
        while let Ok(response) = channels.response_rx.try_recv() {
            app.handle_response(response);
        }

        terminal.draw(|frame| ui::render(app, backdrop.map(|b| b as &dyn Backdrop), frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Short poll keeps the banner and card reveal moving
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(_, height) => {
                    app.update_page_size(height);
                }
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Login overlay captures everything
    if let Some(overlay) = app.login.as_mut() {
        if let Some(result) = overlay.handle_key(key) {
            app.handle_login_result(result);
        }
        return;
    }

    // Blocking dialogs
    match &app.dialog {
        Some(Dialog::ConfirmDelete { .. }) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_confirmation(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_confirmation(false),
                _ => {}
            }
            return;
        }
        Some(Dialog::Alert(_)) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.dismiss_dialog();
            }
            return;
        }
        None => {}
    }

    let typing = app.input_mode == InputMode::Editing
        || (app.view == View::Admin && app.admin_focus == AdminFocus::Form);

    // Help toggle (global)
    if key.code == KeyCode::Char('?') && !typing {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
        return;
    }
    match (app.view, app.admin_focus) {
        (View::Catalog, _) => handle_catalog_key(app, key),
        (View::Admin, AdminFocus::Table) => handle_table_key(app, key),
        (View::Admin, AdminFocus::Form) => handle_form_key(app, key),
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let mut changed = false;
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.query.text.pop();
            changed = true;
        }
        KeyCode::Char(c) => {
            app.query.text.push(c);
            changed = true;
        }
        _ => {}
    }

    if changed {
        app.apply_filter();
    }
}

fn handle_catalog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('p') => app.cycle_platform(true),
        KeyCode::Char('P') => app.cycle_platform(false),
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::PageDown => app.list_page_down(),
        KeyCode::PageUp => app.list_page_up(),
        KeyCode::Char('a') => app.open_admin(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Esc => {
            // Clear search and platform
            if !app.query.is_empty() {
                app.query.text.clear();
                app.query.platform = None;
                app.apply_filter();
            }
        }
        _ => {}
    }
}

fn handle_table_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Down | KeyCode::Char('j') => app.table_next(),
        KeyCode::Up | KeyCode::Char('k') => app.table_prev(),
        KeyCode::Enter | KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('n') => {
            app.form.reset();
            app.admin_focus = AdminFocus::Form;
        }
        KeyCode::Tab => {
            app.admin_focus = AdminFocus::Form;
        }
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('v') | KeyCode::Esc => {
            app.view = View::Catalog;
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Esc => {
            if app.form.is_editing() {
                app.cancel_edit();
            }
            app.admin_focus = AdminFocus::Table;
        }
        KeyCode::Backspace => app.form.pop_char(),
        KeyCode::Char(c) => app.form.push_char(c),
        _ => {}
    }
}
