//! # Events Module
//!
//! Event-driven progress reporting for the import pipeline.
//!
//! ## Design
//! The core library emits events through channels, allowing any front end
//! (CLI, desktop shell, mobile bridge) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::Progress(p)) = event {
//!             println!("{}/{} {}", p.current, p.total, p.last_path);
//!         }
//!     }
//! });
//!
//! library.import(&root, &catalog, &thumbs, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
