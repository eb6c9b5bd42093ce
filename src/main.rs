use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use join_board::api::RemoteStore;
use join_board::app::App;
use join_board::config::Config;
use join_board::session::SessionStore;
use join_board::{logger, ui};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    if let Some(path) = logger::init(&config.logging)? {
        log::info!("Logging to {}", path.display());
    }

    let store = Arc::new(RemoteStore::new(&config.store.url));
    let session = SessionStore::open(config.session_dir()?)?;
    let mut app = App::new(store, session, config.ui.clone());
    app.restore_session().await;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.end_session();
    if let Err(err) = res {
        log::error!("Terminal error: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
