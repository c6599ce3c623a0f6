use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use hifitime::{Duration as EpochDuration, Epoch};
use orrery_core::{
    parse_instant, CatalogId, CoordinateSystem, EquatorialCoordinate, ProjectionMode, SessionConfig,
    TransformPipeline, Viewport,
};
use orrery_data::ephemeris::{service, ModelSource};
use orrery_data::{CatalogFilters, CatalogStore, EphemerisProvider, StarRecord};
use orrery_engine::{OffscreenSky, Orchestrator};
use orrery_sim::Body;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "Star field, planetary ephemeris and sky rendering")]
struct Cli {
    /// Session configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
struct ObserverArgs {
    /// Observer latitude (degrees, north positive)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Observer longitude (degrees, east positive)
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Instant such as 2024-06-21T00:00:00Z; defaults to now
    #[arg(long)]
    at: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project an equatorial position onto the observer's screen
    Project {
        /// Right ascension (degrees)
        #[arg(long)]
        ra: f64,

        /// Declination (degrees)
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,

        #[arg(short, long, default_value = "stereographic")]
        projection: ProjectionMode,

        #[arg(long, default_value = "1920")]
        width: f64,

        #[arg(long, default_value = "1080")]
        height: f64,

        /// Skip atmospheric refraction
        #[arg(long)]
        no_refraction: bool,

        #[command(flatten)]
        observer: ObserverArgs,
    },

    /// Geocentric positions of the Sun, Moon and planets
    Planets {
        #[command(flatten)]
        observer: ObserverArgs,
    },

    /// Aspects between bodies at an instant
    Aspects {
        /// Comma-separated bodies; defaults to every observable body
        #[arg(short, long, value_delimiter = ',')]
        bodies: Vec<Body>,

        /// Orb tolerance (degrees); defaults to the session setting
        #[arg(long)]
        orb: Option<f64>,

        #[arg(long)]
        at: Option<String>,
    },

    /// Retrograde periods of a body within a window
    Retrogrades {
        #[arg(short, long, default_value = "mercury")]
        body: Body,

        /// Window start; defaults to now
        #[arg(long)]
        from: Option<String>,

        /// Window end; defaults to one year after the start
        #[arg(long)]
        to: Option<String>,

        /// Sampling step (days)
        #[arg(long, default_value = "1.0")]
        step: f64,
    },

    /// Lunar phase at an instant
    Moon {
        #[arg(long)]
        at: Option<String>,
    },

    /// Load a star catalog and summarize or export it
    Catalog {
        #[arg(default_value = "hipparcos")]
        catalog: CatalogId,

        /// Faintest magnitude kept
        #[arg(short, long, default_value = "6.5")]
        max_magnitude: f64,

        /// Keep at most this many stars
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the stars as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the local ephemeris model over HTTP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,

        /// Answer with the synthetic model instead of the Keplerian one
        #[arg(long)]
        synthetic: bool,
    },

    /// Open the sky window, or draw one offscreen frame with --headless
    Render {
        #[arg(long)]
        headless: bool,

        #[arg(long, default_value = "1600")]
        width: u32,

        #[arg(long, default_value = "1000")]
        height: u32,

        #[arg(short, long)]
        projection: Option<ProjectionMode>,

        #[arg(short, long)]
        system: Option<CoordinateSystem>,

        /// Include Messier objects
        #[arg(long)]
        deep_sky: bool,

        /// Seconds to wait for catalog and ephemeris data before drawing
        #[arg(long, default_value = "30")]
        wait: u64,

        #[command(flatten)]
        observer: ObserverArgs,
    },
}

/// Flat CSV row for exported stars
#[derive(Serialize)]
struct StarRow<'a> {
    id: &'a str,
    name: &'a str,
    ra: f64,
    dec: f64,
    magnitude: f64,
    color_index: f64,
    spectral_class: &'a str,
    constellation: &'a str,
    distance_pc: Option<f64>,
}

impl<'a> From<&'a StarRecord> for StarRow<'a> {
    fn from(star: &'a StarRecord) -> Self {
        Self {
            id: &star.id,
            name: star.name.as_deref().unwrap_or(""),
            ra: star.position.ra,
            dec: star.position.dec,
            magnitude: star.magnitude,
            color_index: star.color_index,
            spectral_class: &star.spectral_class,
            constellation: &star.constellation,
            distance_pc: star.distance(),
        }
    }
}

fn now() -> Result<Epoch> {
    Epoch::now().map_err(|e| anyhow!("System clock unavailable: {e}"))
}

fn instant_or_now(text: Option<&str>) -> Result<Epoch> {
    match text {
        Some(text) => Ok(parse_instant(text)?),
        None => now(),
    }
}

fn load_session(path: Option<&PathBuf>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load_json(path),
        None => Ok(SessionConfig::default()),
    }
}

/// Command-line observer flags override the session file
fn apply_observer(session: &mut SessionConfig, args: &ObserverArgs) {
    if let Some(lat) = args.lat {
        session.observer.latitude = lat;
    }
    if let Some(lon) = args.lon {
        session.observer.longitude = lon;
    }
    if let Some(at) = &args.at {
        session.observer.instant = Some(at.clone());
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_epoch(epoch: Option<Epoch>) -> String {
    epoch.map_or_else(|| "-".to_string(), |e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut session = load_session(cli.config.as_ref())?;

    match cli.command {
        Commands::Project { ra, dec, projection, width, height, no_refraction, observer } => {
            apply_observer(&mut session, &observer);
            let context = session.observer.to_context(now()?)?;
            let pipeline = TransformPipeline::new(projection, Viewport::new(width, height))
                .with_refraction(!no_refraction);
            let coord = EquatorialCoordinate::j2000(ra, dec);
            let observation = pipeline.observe(&coord, &context);

            if cli.json {
                #[derive(Serialize)]
                struct Projected {
                    horizontal: orrery_core::HorizontalCoordinate,
                    screen: orrery_core::ScreenCoordinate,
                }
                return print_json(&Projected {
                    horizontal: observation.horizontal,
                    screen: observation.screen,
                });
            }

            println!("Observer:   {:.4}°, {:.4}° at {}", context.latitude, context.longitude, context.instant);
            println!("LST:        {:.4}°", context.local_sidereal_degrees());
            println!("Input:      RA {:.4}°, Dec {:.4}° (J2000)", coord.ra, coord.dec);
            println!(
                "Horizontal: Az {:.4}°, Alt {:.4}°",
                observation.horizontal.azimuth, observation.horizontal.altitude
            );
            let screen = observation.screen;
            if screen.visible {
                println!("Screen:     ({:.1}, {:.1}) px [{}]", screen.x, screen.y, projection);
            } else {
                println!("Screen:     below the horizon");
            }
        }

        Commands::Planets { observer } => {
            apply_observer(&mut session, &observer);
            let context = session.observer.to_context(now()?)?;
            let provider = EphemerisProvider::from_settings(&session.ephemeris);
            let reply = runtime()?.block_on(provider.positions(
                Body::observable(),
                context.instant,
                Some(&context),
                session.ephemeris.precision,
            ))?;

            if cli.json {
                return print_json(&reply.data);
            }

            println!("Positions at {} ({:?})", context.instant, reply.provenance);
            println!("{:<9} {:>9} {:>9} {:>11} {:>9} {:>7}", "Body", "RA", "Dec", "Sign", "Dist AU", "Alt");
            for p in &reply.data {
                let alt = p.horizontal.map_or_else(|| "-".to_string(), |h| format!("{:.1}", h.altitude));
                println!(
                    "{:<9} {:>9.3} {:>+9.3} {:>4.1}° {:<11} {:>9.4} {:>7}{}",
                    p.body.name(),
                    p.equatorial.ra,
                    p.equatorial.dec,
                    p.degree,
                    p.sign.to_string(),
                    p.distance_au,
                    alt,
                    if p.retrograde { "  R" } else { "" }
                );
            }
        }

        Commands::Aspects { bodies, orb, at } => {
            let instant = instant_or_now(at.as_deref())?;
            let bodies = if bodies.is_empty() { Body::observable().to_vec() } else { bodies };
            let orb = orb.unwrap_or(session.ephemeris.orb_tolerance);
            let provider = EphemerisProvider::from_settings(&session.ephemeris);
            let reply = runtime()?.block_on(provider.aspects(
                &bodies,
                instant,
                orb,
                session.ephemeris.precision,
            ))?;

            if cli.json {
                return print_json(&reply.data);
            }

            println!("Aspects at {} within {:.1}° ({:?})", instant, orb, reply.provenance);
            if reply.data.is_empty() {
                println!("  none");
            }
            for a in &reply.data {
                println!(
                    "  {:<8} {:<12} {:<8} orb {:.2}°{}{}",
                    a.body1.name(),
                    format!("{:?}", a.kind),
                    a.body2.name(),
                    a.orb,
                    if a.exact { " exact" } else { "" },
                    if a.applying { " applying" } else { " separating" }
                );
            }
        }

        Commands::Retrogrades { body, from, to, step } => {
            let start = instant_or_now(from.as_deref())?;
            let end = match to {
                Some(text) => parse_instant(&text)?,
                None => start + EpochDuration::from_days(365.25),
            };
            let provider = EphemerisProvider::from_settings(&session.ephemeris);
            let reply = runtime()?.block_on(provider.retrogrades(
                body,
                start,
                end,
                step,
                session.ephemeris.precision,
            ))?;

            if cli.json {
                return print_json(&reply.data);
            }

            println!("{} retrogrades from {} to {} ({:?})", body, start, end, reply.provenance);
            if reply.data.is_empty() {
                println!("  none");
            }
            for period in &reply.data {
                println!("  pre-shadow:  {}", fmt_epoch(period.pre_shadow));
                println!("  stationary:  {}", fmt_epoch(period.station_retrograde));
                println!("  direct:      {}", fmt_epoch(period.station_direct));
                println!("  post-shadow: {}", fmt_epoch(period.post_shadow));
                println!("  peak speed:  {:.4}°/day\n", period.peak_speed);
            }
        }

        Commands::Moon { at } => {
            let instant = instant_or_now(at.as_deref())?;
            let provider = EphemerisProvider::from_settings(&session.ephemeris);
            let reply = runtime()?.block_on(provider.moon_phase(instant, session.ephemeris.precision))?;

            if cli.json {
                return print_json(&reply.data);
            }

            let moon = &reply.data;
            println!("Moon at {} ({:?})", instant, reply.provenance);
            println!("  Phase:        {}", moon.name);
            println!("  Illumination: {:.1}%", moon.illumination * 100.0);
            println!("  Age:          {:.2} days", moon.age_days);
            println!("  Elongation:   {:.2}°", moon.elongation);
            println!("  Distance:     {:.0} km", moon.distance_km);
            println!("  Next:         {} around {}", moon.next_phase, moon.next_phase_at);
        }

        Commands::Catalog { catalog, max_magnitude, limit, output } => {
            let store = CatalogStore::from_settings(&session.catalog_source);
            let mut filters = CatalogFilters::default().with_max_magnitude(max_magnitude);
            if let Some(limit) = limit {
                filters = filters.with_limit(limit);
            }
            let loaded = runtime()?.block_on(store.load_catalog(catalog, &filters));

            if let Some(output) = output {
                let mut w = csv::Writer::from_path(&output)
                    .with_context(|| format!("Failed to create {}", output.display()))?;
                for star in &loaded.stars {
                    w.serialize(StarRow::from(star))?;
                }
                w.flush()?;
                info!("Wrote {} stars to {}", loaded.stars.len(), output.display());
                return Ok(());
            }

            if cli.json {
                return print_json(&loaded.stars);
            }

            println!("Catalog {} ({:?}): {} stars", catalog, loaded.provenance, loaded.stars.len());
            for star in loaded.stars.iter().take(20) {
                println!(
                    "  {:<12} {:<16} mag {:>5.2}  B-V {:>5.2}  {}",
                    star.id,
                    star.label(),
                    star.magnitude,
                    star.color_index,
                    star.constellation
                );
            }
            if loaded.stars.len() > 20 {
                println!("  ... {} more", loaded.stars.len() - 20);
            }
        }

        Commands::Serve { addr, synthetic } => {
            let source = if synthetic { ModelSource::synthetic() } else { ModelSource::keplerian() };
            runtime()?.block_on(service::serve(addr, Arc::new(source)))?;
        }

        Commands::Render { headless, width, height, projection, system, deep_sky, wait, observer } => {
            apply_observer(&mut session, &observer);
            if let Some(projection) = projection {
                session.render.projection = projection;
            }
            if let Some(system) = system {
                session.render.coordinate_system = system;
            }
            session.render.show_deep_sky |= deep_sky;
            session.render.validate()?;
            let start = session.observer.resolve_instant(now()?)?;

            if !headless {
                return orrery_engine::run(session, start);
            }

            let mut sky = pollster::block_on(OffscreenSky::new(width, height))?;
            let viewport = Viewport::new(width as f64, height as f64);
            let mut orchestrator = Orchestrator::new(&session, viewport, start)?;
            if !orchestrator.settle(Duration::from_secs(wait)) {
                warn!("Data still loading after {}s; drawing what is available", wait);
            }
            let stats = orchestrator.frame(Instant::now(), &mut sky.target())?;

            if cli.json {
                return print_json(&stats);
            }
            println!("Rendered {}x{} at {}", width, height, start);
            println!(
                "  Stars:   {} visible / {} total ({} culled)",
                stats.visible_stars, stats.total_stars, stats.culled_stars
            );
            println!("  Planets: {}", orchestrator.planets().len());
            println!("  Time:    {:.2} ms", stats.render_time_ms);
            if stats.data_quality.is_degraded() {
                println!("  Note:    approximate data ({:?})", stats.data_quality);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project() {
        let cli = Cli::try_parse_from([
            "orrery", "project", "--ra", "279.23", "--dec", "38.78", "--lat", "40.7", "--lon", "-74.0",
            "-p", "orthographic",
        ])
        .unwrap();
        match cli.command {
            Commands::Project { ra, projection, observer, .. } => {
                assert_eq!(ra, 279.23);
                assert_eq!(projection, ProjectionMode::Orthographic);
                assert_eq!(observer.lon, Some(-74.0));
            }
            _ => panic!("expected project"),
        }
    }

    #[test]
    fn test_parse_body_list() {
        let cli = Cli::try_parse_from(["orrery", "aspects", "--bodies", "mars,venus"]).unwrap();
        match cli.command {
            Commands::Aspects { bodies, .. } => assert_eq!(bodies, vec![Body::Mars, Body::Venus]),
            _ => panic!("expected aspects"),
        }
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Cli::try_parse_from(["orrery", "catalog", "nonsense"]).is_err());
        assert!(Cli::try_parse_from(["orrery", "render", "-p", "fisheye"]).is_err());
        assert!(Cli::try_parse_from(["orrery", "retrogrades", "-b", "vulcan"]).is_err());
    }

    #[test]
    fn test_explicit_instants_parse() {
        let at = instant_or_now(Some("2024-06-21T00:00:00Z")).unwrap();
        assert_eq!(at, Epoch::from_gregorian_utc_at_midnight(2024, 6, 21));
        assert!(instant_or_now(Some("next tuesday")).is_err());
        assert_eq!(fmt_epoch(None), "-");
    }

    #[test]
    fn test_observer_flags_override_session() {
        let mut session = SessionConfig::default();
        let args = ObserverArgs { lat: Some(-33.9), lon: None, at: Some("2024-06-21T00:00:00Z".into()) };
        apply_observer(&mut session, &args);

        assert_eq!(session.observer.latitude, -33.9);
        assert_eq!(session.observer.longitude, SessionConfig::default().observer.longitude);
        let context = session.observer.to_context(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1)).unwrap();
        assert_eq!(context.instant, Epoch::from_gregorian_utc_at_midnight(2024, 6, 21));
    }
}
