pub mod adapter;
pub mod config;
pub mod converter;
pub mod credentials;
pub mod error;
pub mod link;
pub mod matcher;
pub mod models;
pub mod spotify;
pub mod youtube;

pub use adapter::PlatformAdapter;
pub use config::Config;
pub use converter::{ConversionResult, ConversionSession, PlaylistConverter};
pub use credentials::{Credential, CredentialCache, CredentialKey};
pub use error::{AppError, Result};
pub use models::{Platform, Playlist, Track};
pub use spotify::SpotifyAdapter;
pub use youtube::YoutubeAdapter;
