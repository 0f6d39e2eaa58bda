use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;

use agescroll_core::{
    media::{CatalogRefresh, CatalogRefresher, RefreshReason},
    AppConfig, HttpMediaStore, MediaStore,
};
use agescroll_tui::{
    app::{App, Effect, Mode},
    event::{AppEvent, EventHandler, PhotoLoadResult},
    input::{handle_key_event, Action},
    photo_cache::spawn_photo_load,
    scroll::ScrollConfigExt,
    widgets::{HeadshotWidget, PopupWidget, StatusBarWidget, TimelineWidget},
};

/// Start the TUI; `upload` files are sent once the initial catalog is shown
pub async fn run(config: Arc<AppConfig>, upload: Vec<PathBuf>) -> Result<()> {
    super::upload::check_files(&upload)?;
    let store: Arc<dyn MediaStore> = Arc::new(HttpMediaStore::new(&config.store)?);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        SetTitle(&config.ui.title)
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config, store, upload).await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: Arc<AppConfig>,
    store: Arc<dyn MediaStore>,
    upload: Vec<PathBuf>,
) -> Result<()> {
    let mut app = App::new(config.clone());
    app.pending_upload = upload;

    // Channels for background store work
    let (catalog_tx, mut catalog_rx) = mpsc::unbounded_channel::<CatalogRefresh>();
    let (photo_tx, mut photo_rx) = mpsc::unbounded_channel::<PhotoLoadResult>();

    let mut refresher = CatalogRefresher::new(Arc::clone(&store), catalog_tx);
    refresher.refresh(RefreshReason::Initial);
    app.refreshing = true;
    app.set_status("Loading photos...");

    let event_handler = EventHandler::new(
        config.ui.tick_rate_ms,
        config.scroll.animation_tick_duration(),
    );

    // Main loop
    loop {
        // Process completed catalog refreshes (non-blocking)
        while let Ok(refresh) = catalog_rx.try_recv() {
            if refresher.is_current(&refresh) {
                app.apply_catalog_refresh(refresh);
            } else {
                tracing::debug!(
                    generation = refresh.generation,
                    "Ignoring superseded catalog refresh"
                );
            }
        }

        // Upload queued files, then re-list so the timeline picks them up
        if let Some(files) = app.take_upload() {
            refresher.upload_and_refresh(files);
        }

        // Process completed photo loads (non-blocking)
        while let Ok(result) = photo_rx.try_recv() {
            app.photos.finish(result);
        }

        let now = Instant::now();
        terminal.draw(|frame| {
            let size = frame.area();

            // Main layout: content + status bar
            let main_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(size);

            // Headshot | timeline with 1:2 ratio
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
                .split(main_layout[0]);

            let timeline = TimelineWidget::inner(columns[1]);
            app.set_viewport(timeline.width, timeline.height);
            app.update_frame(now);

            HeadshotWidget::render(frame, columns[0], &app);
            TimelineWidget::render(frame, columns[1], &app, now);
            StatusBarWidget::render(frame, main_layout[1], &app);

            if app.mode == Mode::Help {
                PopupWidget::render_help(frame, &app.theme);
            }
        })?;

        // Selection changes drive headshot loads
        if let Some(photo) = app.photo_to_load() {
            spawn_photo_load(Arc::clone(&store), photo, photo_tx.clone());
        }

        // Poll faster while scrolling or revealing
        if let Some(event) = event_handler.next(app.is_animating(Instant::now()))? {
            let action = match event {
                AppEvent::Key(key) => handle_key_event(key, &app),
                AppEvent::ScrollDown => Action::ScrollDown,
                AppEvent::ScrollUp => Action::ScrollUp,
                AppEvent::Resize(_, _) | AppEvent::Tick => Action::None,
            };

            if app.apply(action) == Effect::RefreshCatalog {
                refresher.refresh(RefreshReason::Manual);
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.sync.dispose();
    refresher.shutdown();
    Ok(())
}
