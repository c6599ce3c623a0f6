//! Render config to transform pipeline, and ephemeris/catalog data to overlay geometry

use orrery_core::{
    ConfigError, CoordinateSystem, ObserverContext, PreparedFrame, RenderConfig, TransformPipeline,
    Viewport,
};
use orrery_data::{asterism_segments, PlanetaryPosition, StarRecord};
use orrery_render::{LineVertex, PlanetInstance};
use orrery_sim::Body;

const ASTERISM_COLOR: [f32; 4] = [0.35, 0.5, 0.8, 0.45];

/// Pipeline and display frame selected by the render config
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyView {
    pub pipeline: TransformPipeline,
    pub system: CoordinateSystem,
}

impl SkyView {
    pub fn from_config(config: &RenderConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pipeline: TransformPipeline::new(config.projection, viewport),
            system: config.coordinate_system,
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.pipeline.viewport = viewport;
        self
    }

    pub fn prepare(&self, observer: &ObserverContext) -> PreparedFrame {
        self.pipeline.prepare(observer, self.system)
    }
}

/// Sprite tint for a solar-system body
pub fn body_color(body: Body) -> [f32; 4] {
    match body {
        Body::Sun => [1.0, 0.95, 0.7, 1.0],
        Body::Moon => [0.92, 0.92, 0.88, 1.0],
        Body::Mercury => [0.75, 0.7, 0.65, 1.0],
        Body::Venus => [1.0, 0.97, 0.85, 1.0],
        Body::Earth => [0.4, 0.6, 1.0, 1.0],
        Body::Mars => [1.0, 0.55, 0.35, 1.0],
        Body::Jupiter => [0.95, 0.85, 0.7, 1.0],
        Body::Saturn => [0.95, 0.88, 0.6, 1.0],
        Body::Uranus => [0.65, 0.88, 0.92, 1.0],
        Body::Neptune => [0.45, 0.6, 1.0, 1.0],
        Body::Pluto => [0.8, 0.75, 0.7, 1.0],
    }
}

/// Sprite diameter in pixels: the Sun and Moon large, planets scaled by apparent size
fn body_size(position: &PlanetaryPosition) -> f32 {
    match position.body {
        Body::Sun | Body::Moon => 18.0,
        _ => (4.0 + (position.angular_diameter_arcsec as f32).sqrt() * 0.8).clamp(4.0, 12.0),
    }
}

pub fn planet_sprites(positions: &[PlanetaryPosition]) -> Vec<PlanetInstance> {
    positions
        .iter()
        .map(|p| {
            let v = p.equatorial.to_unit_vector();
            let mut color = body_color(p.body);
            // Moon brightness follows its illuminated fraction
            if p.body == Body::Moon {
                color[3] = (0.35 + 0.65 * p.phase as f32).min(1.0);
            }
            PlanetInstance {
                position: [v.x as f32, v.y as f32, v.z as f32],
                size: body_size(p),
                color,
            }
        })
        .collect()
}

pub fn asterism_lines(stars: &[StarRecord]) -> Vec<LineVertex> {
    asterism_segments(stars)
        .into_iter()
        .flat_map(|(a, b)| {
            let (a, b) = (a.to_unit_vector(), b.to_unit_vector());
            [
                LineVertex::new([a.x as f32, a.y as f32, a.z as f32], ASTERISM_COLOR),
                LineVertex::new([b.x as f32, b.y as f32, b.z as f32], ASTERISM_COLOR),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;
    use orrery_core::ProjectionMode;
    use orrery_data::bright_stars;
    use orrery_data::ephemeris::{positions, KeplerianModel};

    #[test]
    fn test_view_from_config() {
        let config = RenderConfig {
            projection: ProjectionMode::Orthographic,
            coordinate_system: CoordinateSystem::Ecliptic,
            ..Default::default()
        };
        let view = SkyView::from_config(&config, Viewport::new(640.0, 480.0)).unwrap();
        assert_eq!(view.pipeline.projection, ProjectionMode::Orthographic);
        assert_eq!(view.system, CoordinateSystem::Ecliptic);

        let bad = RenderConfig { min_magnitude: 40.0, ..Default::default() };
        assert!(SkyView::from_config(&bad, Viewport::new(640.0, 480.0)).is_err());
    }

    #[test]
    fn test_asterism_lines_pair_up() {
        let lines = asterism_lines(&bright_stars(2.0));
        assert!(!lines.is_empty());
        assert_eq!(lines.len() % 2, 0);
        for v in &lines {
            let n = v.position.iter().map(|c| c * c).sum::<f32>();
            assert!((n - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_planet_sprites() {
        let t = Epoch::from_gregorian_utc(2024, 6, 22, 1, 8, 0, 0);
        let pos = positions::positions(&KeplerianModel, &[Body::Moon, Body::Jupiter], t, None);
        let sprites = planet_sprites(&pos);
        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[0].size, 18.0);
        assert!(sprites[0].color[3] > 0.95, "full moon is at full brightness");
        assert!((4.0..=12.0).contains(&sprites[1].size));
    }
}
