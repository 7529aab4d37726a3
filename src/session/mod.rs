//! Session and token protocol client
//!
//! One [`SessionClient`] owns one authenticated portal session: the cookie
//! jar issued at initialization and the rotating authorization token the
//! server threads through responses. Request handling transparently resolves
//! the server's three in-band signals (fresh token, embedded challenge,
//! session expiry) before results reach the caller.

mod client;
mod form;

pub use client::SessionClient;
pub use form::Form;
