pub mod config;
pub mod host;
pub mod playback;
pub mod script;

pub use config::{ConfigError, Rect, ViewerConfig};
pub use host::{Commit, Dispatch, Segment, ViewHost, ViewId, Views};
pub use playback::{Frame, FrameCounter, FrameSink, JsonLines, Playback, ReplaySummary, replay};
pub use script::{Script, ScriptError};
