//! # seriterm – Serial Terminal Session Core
//!
//! Session-layer logic for a serial-port terminal:
//!
//! - **Codec** – lossless conversion between byte payloads and their hex or
//!   escaped-text display representation
//! - **Transcript** – append-only record of every exchanged frame with
//!   relative timing, replayable for full redraws
//! - **Send History** – deduplicating most-recent-first recall stack for
//!   previously sent payloads
//! - **Input Reformatting** – canonical hex grouping of live keystroke input
//!   with cursor-stable reformatting, and mode-switch re-encoding
//! - **Session Management** – async session runner over an injected port
//!   transport, with command/event channel bridging

pub mod terminal;
