//! The request funnel: pacing, captcha detection and token bookkeeping for
//! every outgoing call.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Verb};
