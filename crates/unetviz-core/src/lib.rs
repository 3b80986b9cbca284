//! UNetViz core
//!
//! Engine-agnostic model of the U-Net diagram: the scene arena, the object
//! registry, diagram primitives, highlight and slider animations, pointer
//! picking and the viewer configuration.

pub mod builder;
pub mod camera;
pub mod color;
pub mod config;
pub mod diagram;
pub mod geometry;
pub mod highlight;
pub mod layout;
pub mod material;
pub mod picker;
pub mod ray;
pub mod registry;
pub mod scene;
pub mod slider;
pub mod task;
pub mod texture;
pub mod viewport;

pub use glam;

pub use builder::{CubeEntry, Endpoint, ImageCube, PendingCube};
pub use camera::PerspectiveCamera;
pub use color::{Hsl, Rgb};
pub use config::{ConfigError, ViewerConfig};
pub use diagram::{Diagram, DiagramError};
pub use geometry::Geometry;
pub use highlight::{Axis, HighlightSettings, PositionOffset};
pub use material::{Material, MaterialSlot};
pub use picker::{hover_caption, pick, pointer_to_ndc, Hit, DEFAULT_PROMPT};
pub use registry::{ObjectRegistry, UNKNOWN_OBJECT};
pub use scene::{Node, NodeId, NodeKind, Scene, Transform};
pub use task::{Animations, CancelToken, SliderHandle, Task, TaskStatus};
pub use texture::TextureState;
pub use viewport::CanvasRect;
