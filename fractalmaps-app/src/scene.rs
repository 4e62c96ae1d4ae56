use tracing::{debug, info};

use fractalmaps_core::{location, Complex, FractalParameters, ViewTransform};
use fractalmaps_render::{RenderSession, SessionState};

use crate::adapter::{self, ViewEvent};
use crate::settings::Settings;

/// The main Mandelbrot graph plus the little Julia graph whose seed is
/// picked on the main one.
pub struct Scene {
    pub main: RenderSession,
    pub little: RenderSession,
}

impl Scene {
    /// Build both graphs, restoring the views remembered in `settings`.
    pub fn new(
        settings: &Settings,
        main_size: (u32, u32),
        little_size: (u32, u32),
    ) -> fractalmaps_render::Result<Self> {
        let config = settings.session_config();
        let max_iter = settings.max_iterations();

        let main_view = restore_area(&settings.previous_main_graph_area, main_size)
            .unwrap_or_else(|| ViewTransform::default_mandelbrot(main_size.0, main_size.1));

        let (julia_view, seed) = location::load_julia(&settings.previous_julia_graph)
            .unwrap_or_else(|| {
                (
                    ViewTransform::default_julia(little_size.0, little_size.1),
                    FractalParameters::default_julia_seed(),
                )
            });
        let little_view = restore_area(&settings.previous_little_graph_area, little_size)
            .or_else(|| julia_view.resized(little_size.0, little_size.1).ok())
            .unwrap_or_else(|| ViewTransform::default_julia(little_size.0, little_size.1));

        let main = RenderSession::new(
            config,
            main_view,
            FractalParameters::mandelbrot(max_iter)?,
            settings.mandelbrot_scheme(),
        )?;
        let little = RenderSession::new(
            config,
            little_view,
            FractalParameters::julia(seed, max_iter)?,
            settings.julia_scheme(),
        )?;
        debug!(
            main_scale = main_view.scale,
            little_scale = little_view.scale,
            seed_re = seed.re,
            seed_im = seed.im,
            "Scene restored"
        );
        Ok(Self { main, little })
    }

    /// Render both graphs from their current views.
    pub fn start(&mut self) -> fractalmaps_render::Result<()> {
        self.main.request_render(*self.main.transform(), *self.main.params())?;
        self.little.request_render(*self.little.transform(), *self.little.params())
    }

    /// Route an event from the main graph. A picked point becomes the
    /// little graph's seed.
    pub fn handle_main(&mut self, event: ViewEvent) -> fractalmaps_render::Result<()> {
        if let Some(seed) = adapter::apply(&mut self.main, event)? {
            self.set_seed(seed)?;
        }
        Ok(())
    }

    /// Route an event from the little graph. Seeds are only picked on
    /// the main graph, so a tap here is ignored.
    pub fn handle_little(&mut self, event: ViewEvent) -> fractalmaps_render::Result<()> {
        if matches!(event, ViewEvent::SeedPicked { .. }) {
            debug!("Ignoring seed pick on the Julia graph");
            return Ok(());
        }
        adapter::apply(&mut self.little, event)?;
        Ok(())
    }

    pub fn seed(&self) -> Complex {
        self.little.params().julia_seed
    }

    fn set_seed(&mut self, seed: Complex) -> fractalmaps_render::Result<()> {
        info!(re = seed.re, im = seed.im, "Julia seed picked");
        self.little.set_julia_seed(seed)
    }

    /// Merge whatever tiles are ready on either graph.
    pub fn poll(&mut self) -> usize {
        self.main.poll() + self.little.poll()
    }

    pub fn run_to_completion(&mut self) -> (SessionState, SessionState) {
        (self.main.run_to_completion(), self.little.run_to_completion())
    }

    /// Write the current views into `settings` for the next start.
    pub fn store_snapshots(&self, settings: &mut Settings) {
        settings.previous_main_graph_area = location::save(self.main.transform());
        settings.previous_little_graph_area = location::save(self.little.transform());
        settings.previous_julia_graph = location::save_julia(self.little.transform(), self.seed());
        settings.mandelbrot_colours = self.main.colour_scheme().id().to_string();
        settings.julia_colours = self.little.colour_scheme().id().to_string();
    }
}

/// A remembered view, refitted to the current viewport size.
fn restore_area(snapshot: &str, (width, height): (u32, u32)) -> Option<ViewTransform> {
    let saved = location::load(snapshot)?;
    if (saved.width, saved.height) == (width, height) {
        Some(saved)
    } else {
        saved.resized(width, height).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalmaps_render::ColourScheme;

    fn settings() -> Settings {
        Settings {
            worker_threads: 2,
            tile_edge: 32,
            max_iterations: 64,
            ..Settings::default()
        }
    }

    #[test]
    fn fresh_scene_uses_defaults() {
        let scene = Scene::new(&settings(), (120, 90), (40, 40)).unwrap();
        assert_eq!(*scene.main.transform(), ViewTransform::default_mandelbrot(120, 90));
        assert_eq!(*scene.little.transform(), ViewTransform::default_julia(40, 40));
        assert_eq!(scene.seed(), FractalParameters::default_julia_seed());
        assert_eq!(scene.main.colour_scheme(), ColourScheme::MandelbrotDefault);
        assert_eq!(scene.little.colour_scheme(), ColourScheme::JuliaDefault);
    }

    #[test]
    fn picking_a_seed_rerenders_the_little_graph() {
        let mut scene = Scene::new(&settings(), (120, 90), (40, 40)).unwrap();
        scene.start().unwrap();
        scene.run_to_completion();
        let little_generation = scene.little.generation();
        let main_generation = scene.main.generation();

        scene.handle_main(ViewEvent::SeedPicked { px: 10.0, py: 20.0 }).unwrap();

        let expected = scene
            .main
            .mapper()
            .pixel_to_complex(10.0, 20.0, scene.main.transform());
        assert_eq!(scene.seed(), expected);
        assert_eq!(scene.main.generation(), main_generation);
        assert!(scene.little.generation() > little_generation);
        assert_eq!(
            scene.run_to_completion(),
            (SessionState::Done, SessionState::Done)
        );
    }

    #[test]
    fn seed_pick_on_little_graph_is_ignored() {
        let mut scene = Scene::new(&settings(), (120, 90), (40, 40)).unwrap();
        let seed = scene.seed();
        scene.handle_little(ViewEvent::SeedPicked { px: 5.0, py: 5.0 }).unwrap();
        assert_eq!(scene.seed(), seed);
        assert_eq!(scene.little.generation(), 0);
    }

    #[test]
    fn polling_drives_both_graphs_to_done() {
        let mut scene = Scene::new(&settings(), (120, 90), (40, 40)).unwrap();
        scene.start().unwrap();
        scene.handle_main(ViewEvent::Dragged { dx: 8.0, dy: -4.0 }).unwrap();
        let mut merged = 0;
        while scene.main.state().is_running() || scene.little.state().is_running() {
            merged += scene.poll();
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!(merged > 0);
        assert_eq!(scene.main.state(), SessionState::Done);
        assert_eq!(scene.little.state(), SessionState::Done);
    }

    #[test]
    fn snapshots_survive_a_restart() {
        let mut stored = settings();
        {
            let mut scene = Scene::new(&stored, (120, 90), (40, 40)).unwrap();
            scene.handle_main(ViewEvent::Pinched { focus_x: 30.0, focus_y: 30.0, factor: 4.0 }).unwrap();
            scene.handle_main(ViewEvent::SeedPicked { px: 60.0, py: 10.0 }).unwrap();
            scene.handle_little(ViewEvent::Dragged { dx: 3.0, dy: 2.0 }).unwrap();
            scene
                .handle_little(ViewEvent::ColourSchemeChanged("Smooth".into()))
                .unwrap();
            scene.store_snapshots(&mut stored);

            let restored = Scene::new(&stored, (120, 90), (40, 40)).unwrap();
            assert_eq!(restored.main.transform(), scene.main.transform());
            assert_eq!(restored.little.transform(), scene.little.transform());
            assert_eq!(restored.seed(), scene.seed());
            assert_eq!(restored.little.colour_scheme(), ColourScheme::Smooth);
        }
    }

    #[test]
    fn corrupt_snapshots_fall_back_to_defaults() {
        let stored = Settings {
            previous_main_graph_area: "garbage".into(),
            previous_julia_graph: "{\"origin_re\":1.0}".into(),
            ..settings()
        };
        let scene = Scene::new(&stored, (120, 90), (40, 40)).unwrap();
        assert_eq!(*scene.main.transform(), ViewTransform::default_mandelbrot(120, 90));
        assert_eq!(scene.seed(), FractalParameters::default_julia_seed());
    }

    #[test]
    fn restored_view_is_refitted_to_new_size() {
        let mut stored = settings();
        let scene = Scene::new(&stored, (120, 90), (40, 40)).unwrap();
        scene.store_snapshots(&mut stored);

        let bigger = Scene::new(&stored, (240, 180), (40, 40)).unwrap();
        let t = bigger.main.transform();
        assert_eq!((t.width, t.height), (240, 180));
        let c0 = scene.main.transform().center();
        let c1 = t.center();
        assert!((c0.re - c1.re).abs() < 1e-12 && (c0.im - c1.im).abs() < 1e-12);
    }
}
