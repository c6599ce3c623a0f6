//! Frame orchestration for the sky renderer: the per-frame loop, async data
//! fetches, picking, and the interactive window.

pub mod fps;
pub mod orchestrator;
pub mod picking;
pub mod target;
pub mod view;
pub mod window;

pub use fps::FpsCounter;
pub use orchestrator::{Orchestrator, DEFAULT_BUCKET_SECONDS};
pub use picking::{pick_nearest, project_stars, PICK_RADIUS_PX};
pub use target::{OffscreenSky, RendererTarget, SkyTarget};
pub use view::{asterism_lines, body_color, planet_sprites, SkyView};
pub use window::run;
