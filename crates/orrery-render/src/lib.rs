//! wgpu star-field renderer: instanced star sprites, planet sprites and
//! asterism lines, all projected on the GPU from J2000 unit vectors.

pub mod color;
pub mod context;
pub mod culling;
pub mod error;
pub mod gpu_types;
pub mod renderer;

pub use color::bv_to_rgb;
pub use context::GpuContext;
pub use culling::{CullCounts, CullingStrategy};
pub use error::{RenderError, RenderResult};
pub use gpu_types::{LineVertex, PlanetInstance, SkyUniform};
pub use renderer::{StarRenderer, MAX_LINE_VERTICES, MAX_PLANETS};
