//! Visibility accounting for uploaded stars
//!
//! The GPU always clips hidden stars itself; a strategy only decides whether the
//! renderer spends CPU time counting them for [`FrameStats`](orrery_core::FrameStats).

use glam::DVec3;
use orrery_core::{FrameStats, PreparedFrame};

/// Sprites this far outside the viewport still count as visible (largest sprite radius)
const EDGE_MARGIN_PX: f64 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullingStrategy {
    /// Report every uploaded star as visible and leave clipping to the GPU
    #[default]
    None,
    /// Project every star on the CPU and count those above the horizon and on screen
    CpuFrustum,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullCounts {
    pub visible: u32,
    pub culled: u32,
}

impl CullingStrategy {
    pub fn count(&self, positions: &[[f32; 3]], frame: &PreparedFrame) -> CullCounts {
        let total = positions.len() as u32;
        match self {
            Self::None => CullCounts { visible: total, culled: 0 },
            Self::CpuFrustum => {
                let visible = positions.iter().filter(|p| on_screen(p, frame)).count() as u32;
                CullCounts { visible, culled: total - visible }
            }
        }
    }

    /// Star counts and timing for one drawn frame; fps and data quality are the host's
    pub fn frame_stats(
        &self,
        positions: &[[f32; 3]],
        frame: &PreparedFrame,
        render_time_ms: f64,
    ) -> FrameStats {
        let counts = self.count(positions, frame);
        FrameStats {
            total_stars: positions.len() as u32,
            visible_stars: counts.visible,
            culled_stars: counts.culled,
            render_time_ms,
            ..Default::default()
        }
    }
}

fn on_screen(position: &[f32; 3], frame: &PreparedFrame) -> bool {
    let v = DVec3::new(position[0] as f64, position[1] as f64, position[2] as f64);
    let screen = frame.observe_unit(v).screen;
    let viewport = frame.viewport();
    screen.visible
        && (-EDGE_MARGIN_PX..=viewport.width + EDGE_MARGIN_PX).contains(&screen.x)
        && (-EDGE_MARGIN_PX..=viewport.height + EDGE_MARGIN_PX).contains(&screen.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;
    use orrery_core::{CoordinateSystem, ObserverContext, ProjectionMode, TransformPipeline, Viewport};

    fn frame() -> PreparedFrame {
        let observer = ObserverContext::fallback(Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0));
        TransformPipeline::new(ProjectionMode::Stereographic, Viewport::new(800.0, 600.0))
            .prepare(&observer, CoordinateSystem::Horizontal)
    }

    #[test]
    fn test_none_counts_everything_visible() {
        let counts = CullingStrategy::None.count(&[[1.0, 0.0, 0.0], [0.0, 0.0, -1.0]], &frame());
        assert_eq!(counts, CullCounts { visible: 2, culled: 0 });
    }

    #[test]
    fn test_cpu_frustum_drops_below_horizon() {
        // Celestial poles: the north pole sits 40.7° up from New York, the south pole below
        let counts = CullingStrategy::CpuFrustum.count(&[[0.0, 0.0, 1.0], [0.0, 0.0, -1.0]], &frame());
        assert_eq!(counts, CullCounts { visible: 1, culled: 1 });
    }

    #[test]
    fn test_empty_upload() {
        assert_eq!(CullingStrategy::CpuFrustum.count(&[], &frame()), CullCounts::default());
    }

    #[test]
    fn test_zero_star_frame_stats() {
        for strategy in [CullingStrategy::None, CullingStrategy::CpuFrustum] {
            let stats = strategy.frame_stats(&[], &frame(), 0.25);
            assert_eq!(stats.total_stars, 0);
            assert_eq!(stats.visible_stars, 0);
            assert_eq!(stats.culled_stars, 0);
            assert_eq!(stats.render_time_ms, 0.25);
        }
    }

    #[test]
    fn test_frame_stats_totals_add_up() {
        let positions = [[0.0, 0.0, 1.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]];
        let stats = CullingStrategy::CpuFrustum.frame_stats(&positions, &frame(), 1.0);
        assert_eq!(stats.total_stars, 3);
        assert_eq!(stats.visible_stars + stats.culled_stars, 3);
        assert!(stats.culled_stars >= 1, "south celestial pole is below New York's horizon");
    }
}
