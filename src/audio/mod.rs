//! # Audio Module
//!
//! Playback for the jukebox: a single session that owns the voice connection,
//! the player and the request queue.
//!
//! ## Architecture
//!
//! ### [`session`] - Playback Session
//! - One task owns all playback state and applies commands and player events
//!   in arrival order
//! - Retries rejected media fetches a bounded number of times
//! - Leaves the voice channel after an idle window with nothing queued
//!
//! ### [`player`] - Voice Backend
//! - [`player::VoiceBackend`] is the seam between the session and songbird
//! - [`player::SongbirdBackend`] joins channels and plays yt-dlp inputs
//!
//! ### [`events`] - Driver Events
//! - Forwards songbird track and connection events into the session inbox
//! - Classifies playback failures as transient or fatal
//!
//! ### [`queue`] - Request Queue
//! - FIFO with head insertion, each entry remembers who asked for it

pub mod events;
pub mod player;
pub mod queue;
pub mod session;
