pub mod config;
pub mod details;
pub mod diagnostics;
pub mod fixtures;
pub mod model;
pub mod navigator;
pub mod persistence;
pub mod playback;
pub mod report;
pub mod session;
pub mod source;
pub mod time;
pub mod timeline;

pub use config::AppConfig;
pub use details::{ActiveDetails, ElementCard};
pub use diagnostics::{TelemetryGuard, init_tracing};
pub use model::{
    Composition, CompositionUnit, Dialogue, ElementBody, ElementCollection, ElementIndex,
    EventKind, Project, StoryElement, TimelineEvent,
};
pub use navigator::{next_boundary, prev_boundary};
pub use playback::{ClockUpdate, PlayState, PlaybackClock};
pub use report::{TimelineReport, generate_timeline_report};
pub use session::{
    CursorChange, LoadOutcome, LoadTicket, PlayerObserver, PlayerSession, SessionError,
};
pub use source::{ProjectCatalog, ProjectSource};
pub use time::{DEFAULT_EVENT_DURATION_SECONDS, format_timecode, parse_time};
pub use timeline::{Resolution, TimelineIndex, build_timeline, resolve};
