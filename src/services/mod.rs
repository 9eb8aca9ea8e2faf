pub mod library;
pub mod retry;
pub mod spotify;
pub mod ytmusic;
