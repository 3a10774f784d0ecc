pub mod buffer;
pub mod camera;
pub mod config;
pub mod constants;
pub mod data;
pub mod display;
pub mod error;
pub mod explode;
pub mod fold;
pub mod host;
pub mod initializer;
pub mod scene;
pub mod screenshot;
pub mod session;
pub mod shortcut;
pub mod updater;

pub use camera::{Camera, CameraRig};
pub use config::ViewerConfig;
pub use data::SceneData;
pub use error::{Result, SceneError};
pub use host::{Host, VectorRenderer};
pub use scene::{ObjectKind, SceneGraph, SceneNode};
pub use session::{bind, Session, Shared};
