//! # Events Module
//!
//! Progress reporting through channels.
//!
//! ## Design
//! The core library emits events through channels, allowing any front end
//! to subscribe and display progress. A scan's live state can also be polled
//! through its `ScanSession`; events are a push view of the same data.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Scan(ScanEvent::Progress(p)) = event {
//!             println!("{}/{} photos", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! worker.run_with_events(&folder, &session, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
