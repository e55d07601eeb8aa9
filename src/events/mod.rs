//! # Events Module
//!
//! Progress reporting for indexing and import comparison.
//!
//! ## Design
//! The core library emits events through channels, so the CLI (or any other
//! front end) can render progress without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Index(IndexEvent::Progress(p)) = event {
//!             println!("Fingerprinted {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! let pipeline = Pipeline::builder().paths(vec![root]).index(index).build();
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
