// 播放引擎核心模块

pub mod mode_detector;
pub mod progress_store;
pub mod fullscreen;
pub mod registry;
pub mod surface;
pub mod overlay;
pub mod manager;

pub use mode_detector::classify;
pub use progress_store::{JsonFileStore, KeyValueStore, MemoryStore, ProgressStore};
pub use fullscreen::{FullscreenOrientationManager, FullscreenOutcome, FullscreenPlatform, NoFullscreen, SurfaceHandle};
pub use registry::{quality_label, ServerQualityRegistry};
pub use surface::{PlaybackSurface, SurfaceHost};
pub use overlay::{Chrome, ControlsOverlay, Menu};
pub use manager::{EventInbox, PlaybackManager, PlaybackRequest};
