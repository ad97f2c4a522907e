//! HTTP request handlers organized by functionality

pub mod health;
pub mod songs;
pub mod streaming;
pub mod users;

// Re-export handler functions
pub use health::{HealthStatus, health};
pub use songs::{SongDetails, song_details};
pub use streaming::{stream_song, stream_song_android};
pub use users::{PreferenceUpdate, update_preference};
