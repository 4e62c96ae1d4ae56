use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use fractalmaps_render::{RenderSession, SessionState};

use fractalmaps_app::adapter::ViewEvent;
use fractalmaps_app::scene::Scene;
use fractalmaps_app::settings::Settings;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Size of the main graph.
const MAIN_SIZE: (u32, u32) = (1024, 768);
/// Size of the little Julia graph in the corner.
const LITTLE_SIZE: (u32, u32) = (256, 192);
/// Sleep between polls while tiles are still arriving.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy)]
enum Graph {
    Main,
    Little,
}

/// A short exploration session: nudge the main view, zoom into the
/// seahorse valley, pick a seed there and zoom the Julia graph.
fn scripted_events() -> Vec<(Graph, ViewEvent)> {
    let (w, h) = (MAIN_SIZE.0 as f64, MAIN_SIZE.1 as f64);
    vec![
        (Graph::Main, ViewEvent::Dragged { dx: -w / 16.0, dy: 0.0 }),
        (
            Graph::Main,
            ViewEvent::Pinched {
                focus_x: w * 0.52,
                focus_y: h * 0.42,
                factor: 2.0,
            },
        ),
        (Graph::Main, ViewEvent::SeedPicked { px: w * 0.52, py: h * 0.42 }),
        (Graph::Main, ViewEvent::MaxIterationsChanged(512)),
        (
            Graph::Little,
            ViewEvent::Pinched {
                focus_x: LITTLE_SIZE.0 as f64 / 2.0,
                focus_y: LITTLE_SIZE.1 as f64 / 2.0,
                factor: 1.5,
            },
        ),
    ]
}

fn summarize(name: &str, session: &RenderSession, state: SessionState) {
    let escapes = session.escapes();
    let interior = escapes.data.iter().filter(|r| r.is_interior()).count();
    let t = session.transform();
    let centre = t.center();
    info!(
        graph = name,
        state = state.label(),
        generation = session.generation(),
        width = t.width,
        height = t.height,
        centre_re = centre.re,
        centre_im = centre.im,
        scale = t.scale,
        interior_pct = 100.0 * interior as f64 / escapes.data.len().max(1) as f64,
        colours = %session.colour_scheme(),
        "Graph rendered"
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> fractalmaps_render::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting FractalMaps");

    let mut settings = Settings::load();
    let mut scene = Scene::new(&settings, MAIN_SIZE, LITTLE_SIZE)?;

    let started = Instant::now();
    scene.start()?;
    let (main_state, little_state) = scene.run_to_completion();
    info!(elapsed_ms = started.elapsed().as_millis(), "Scene rendered");

    summarize("main", &scene.main, main_state);
    summarize("little", &scene.little, little_state);

    let started = Instant::now();
    for (graph, event) in scripted_events() {
        match graph {
            Graph::Main => scene.handle_main(event)?,
            Graph::Little => scene.handle_little(event)?,
        }
    }
    let mut merged = 0;
    while scene.main.state().is_running() || scene.little.state().is_running() {
        merged += scene.poll();
        thread::sleep(POLL_INTERVAL);
    }
    info!(
        elapsed_ms = started.elapsed().as_millis(),
        tiles = merged,
        "Scripted events rendered"
    );

    summarize("main", &scene.main, scene.main.state());
    summarize("little", &scene.little, scene.little.state());

    scene.store_snapshots(&mut settings);
    settings.save();
    Ok(())
}
