pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod session;

pub use orchestrator::PlaylistConverter;
pub use progress::{
    ConsoleReporter, EventStreamReporter, ProgressEvent, ProgressReporter, SilentReporter,
};
pub use report::{ConversionResult, ConversionSummary, DestinationPlaylist, save_conversion_result};
pub use session::{ConversionPreview, ConversionSession, ConversionStage, Verification};
