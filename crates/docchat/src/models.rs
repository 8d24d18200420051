//! These models represent the objects exchanged between a chat client and the search adapter
//!
//! There are three related formats we need to interact with:
//! - chat messages sent by the widget (`useChat` style messages with typed parts)
//! - search results returned by the documentation search backend
//! - stream events sent back to the widget, see [`crate::stream`]
//!
//! The serde attributes keep the wire names of the chat protocol so requests
//! from the widget can be decoded directly.
pub mod message;
pub mod request;
pub mod role;
pub mod search;
