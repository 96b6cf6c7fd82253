//! Transport layer for GEDSys.
//!
//! Implements the artifact store contract over SFTP and a local directory,
//! the SensorThings API client, the generators that push formatted
//! observations into deployed receiver endpoints, and the HTTP sink that
//! receives publisher notifications.

pub mod listener;
pub mod local;
pub mod push;
pub mod sensor;
pub mod sftp;

pub use listener::{notification_router, serve_notifications, ListenerState};
pub use local::LocalDirStore;
pub use push::{map_observation, stream_all, StreamGenerator, StreamingOutcome};
pub use sensor::{is_valid_wkt_polygon, thing_coordinates, ObservationsBuffer, SensorApi};
pub use sftp::SftpStore;
