//! Concrete collaborators and job orchestration

pub mod acrcloud_client;
pub mod downloader;
pub mod job_orchestrator;
pub mod segmenter;
pub mod tracklist_writer;
pub mod youtube_resolver;

pub use acrcloud_client::{AcrCloudClient, AcrCloudConfig, AcrCloudError};
pub use downloader::ScdlDownloader;
pub use job_orchestrator::{JobOrchestrator, JobRecord, JobRegistry};
pub use segmenter::AudioSegmenter;
pub use tracklist_writer::TracklistWriter;
pub use youtube_resolver::YouTubeResolver;
