mod config;
mod connectivity;
mod dashboard;
mod models;
mod profile;
mod remote;
mod telemetry;
mod utils;
mod weather;

use log::{debug, error, info, warn};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use config::DashboardConfig;
use connectivity::watch_connectivity;
use dashboard::{render_profile, Dashboard, Teardown};
use models::DashboardEvent;
use profile::{prompt_registration, ProfileStore};
use remote::{spawn_subscription, RemoteStore};
use telemetry::{SIGNAL_LOG_PATH, TEMPERATURE_LOG_PATH, TEMPERATURE_PATH};
use utils::now_local;
use weather::load_weather;

const CLOCK_INTERVAL_SECS: u64 = 1;
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Registration,
    Dashboard,
}

async fn initial_screen(profiles: &ProfileStore) -> Screen {
    match profiles.is_registered().await {
        Ok(true) => Screen::Dashboard,
        Ok(false) => Screen::Registration,
        Err(e) => {
            warn!("Could not read profile, asking for registration: {}", e);
            Screen::Registration
        }
    }
}

async fn show_profile(profiles: &ProfileStore) {
    match profiles.load().await {
        Ok(profile) => {
            for line in render_profile(&profile) {
                info!("{}", line);
            }
        }
        Err(e) => error!("Error loading profile: {}", e),
    }
}

async fn run_dashboard(
    config: DashboardConfig,
    store: RemoteStore,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting dashboard");

    let (tx, mut events) = mpsc::channel(EVENT_BUFFER);
    let mut teardown = Teardown::default();

    // Live telemetry
    teardown.push(spawn_subscription(
        store.clone(),
        TEMPERATURE_PATH,
        tx.clone(),
        DashboardEvent::Temperature,
    ));
    teardown.push(spawn_subscription(
        store.clone(),
        TEMPERATURE_LOG_PATH,
        tx.clone(),
        DashboardEvent::TemperatureLog,
    ));
    teardown.push(spawn_subscription(
        store.clone(),
        SIGNAL_LOG_PATH,
        tx.clone(),
        DashboardEvent::SignalLog,
    ));

    // Weather is loaded once at startup
    let weather_tx = tx.clone();
    let weather_config = config.clone();
    teardown.push(tokio::spawn(async move {
        let state = load_weather(&weather_config).await;
        let _ = weather_tx.send(DashboardEvent::Weather(state)).await;
    }));
    drop(tx);

    let (mut connectivity, probe) = watch_connectivity(store, config.probe_interval);
    teardown.push(probe);
    let mut probe_alive = true;

    let mut clock = interval(Duration::from_secs(CLOCK_INTERVAL_SECS));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut dashboard = Dashboard::new(now_local());
    let mut telemetry_open = true;

    // Runs until the caller drops it
    loop {
        let changed = tokio::select! {
            event = events.recv(), if telemetry_open => match event {
                Some(event) => dashboard.apply(event),
                None => {
                    warn!("All telemetry subscriptions have ended");
                    telemetry_open = false;
                    false
                }
            },
            result = connectivity.changed(), if probe_alive => {
                if result.is_err() {
                    warn!("Connectivity probe stopped");
                    probe_alive = false;
                    false
                } else {
                    match *connectivity.borrow_and_update() {
                        Some(connected) => dashboard.apply(DashboardEvent::Connectivity(connected)),
                        None => false,
                    }
                }
            },
            _ = clock.tick() => {
                dashboard.apply(DashboardEvent::Tick(now_local()));
                debug!("{}", dashboard.clock_line());
                false
            },
        };

        if changed {
            for line in dashboard.render() {
                info!("{}", line);
            }
        }
    }
}

async fn main_loop(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = RemoteStore::from_config(&config)?;
    let profiles = ProfileStore::new(config.profile_path.clone());

    if initial_screen(&profiles).await == Screen::Registration {
        let mut stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        prompt_registration(&mut stdin, &mut stdout, &profiles, &store).await?;
    }

    show_profile(&profiles).await;
    run_dashboard(config, store).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match DashboardConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Dashboard stopped"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
