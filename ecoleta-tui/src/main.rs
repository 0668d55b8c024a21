//! Terminal UI for registering a waste collection point with Ecoleta.

mod app;
mod config;
mod input;
mod ui;

use std::{
    fs::{self, OpenOptions},
    io,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ecoleta_core::{Backends, Coordinate, EcoletaService, FormEvent, FormState, GeolocationPort};
use ecoleta_provider_catalog::HttpCatalogPort;
use ecoleta_provider_geoip::{DisabledGeolocator, FixedGeolocator, IpApiGeolocator};
use ecoleta_provider_ibge::IbgeGeographyPort;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use reqwest::Client;
use tokio::{
    sync::mpsc::{UnboundedSender, unbounded_channel},
    task::JoinSet,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::{GeolocationConfig, TuiConfig};
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let config = TuiConfig::load()?;
    init_logging(&config)?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent(concat!("ecoleta-tui/", env!("CARGO_PKG_VERSION")))
        .timeout(StdDuration::from_millis(config.request_timeout_ms))
        .build()?;
    let service = Arc::new(build_service(&config, &client));

    // App state
    let app = App::new(
        FormState::new(config.form_options()),
        config.map_zoom,
        config.tile_url.clone(),
    );

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, service).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = ?err, "event loop failed");
    }
    res
}

// The terminal belongs to the UI, so logs go to a file in the data directory.
fn init_logging(config: &TuiConfig) -> Result<()> {
    let Some(dir) = TuiConfig::data_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ecoleta-tui.log"))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()?;
    Ok(())
}

fn build_service(config: &TuiConfig, client: &Client) -> EcoletaService {
    let geolocation: Arc<dyn GeolocationPort> = match &config.geolocation {
        GeolocationConfig::Ip => Arc::new(IpApiGeolocator::new(client.clone())),
        GeolocationConfig::Fixed {
            latitude,
            longitude,
        } => Arc::new(FixedGeolocator::new(Coordinate::new(*latitude, *longitude))),
        GeolocationConfig::Off => Arc::new(DisabledGeolocator),
    };
    tracing::info!(
        catalog = %config.catalog_url,
        geography = %config.geography_url,
        geolocation = ?config.geolocation,
        "starting"
    );

    EcoletaService::new(Backends {
        catalog: Arc::new(HttpCatalogPort::new(client.clone(), &config.catalog_url)),
        geography: Arc::new(IbgeGeographyPort::with_base_url(
            client.clone(),
            &config.geography_url,
        )),
        geolocation,
    })
    .with_retry(config.retry_policy())
    .with_locate_timeout(StdDuration::from_millis(config.geolocation_timeout_ms))
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    service: Arc<EcoletaService>,
) -> Result<()> {
    let (tx, mut rx) = unbounded_channel::<FormEvent>();
    let mut tasks = JoinSet::new();

    dispatch(&mut app, FormEvent::Mounted, &service, &tx, &mut tasks);

    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Apply finished requests in arrival order
        while let Ok(event) = rx.try_recv() {
            dispatch(&mut app, event, &service, &tx, &mut tasks);
        }
        while let Some(joined) = tasks.try_join_next() {
            if let Err(err) = joined {
                tracing::error!(error = %err, "request task failed");
            }
        }

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))? {
            let input = event::read()?;
            let size = terminal.size()?;
            let screen = Rect::new(0, 0, size.width, size.height);

            match input::handle_event(input, &mut app, screen) {
                Action::Quit => break,
                Action::None => {}
                Action::Dispatch(event) => dispatch(&mut app, event, &service, &tx, &mut tasks),
            }
        }
    }

    // Nothing may touch the form once the loop is gone
    tasks.abort_all();
    Ok(())
}

fn dispatch(
    app: &mut App,
    event: FormEvent,
    service: &Arc<EcoletaService>,
    tx: &UnboundedSender<FormEvent>,
    tasks: &mut JoinSet<()>,
) {
    for effect in app.apply(event) {
        tracing::debug!(?effect, "running effect");
        let service = Arc::clone(service);
        let tx = tx.clone();
        tasks.spawn(async move {
            let event = service.perform(effect).await;
            if tx.send(event).is_err() {
                tracing::debug!("form closed before the response arrived");
            }
        });
    }
}
