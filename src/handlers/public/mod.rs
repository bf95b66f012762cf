// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration and token acquisition. Every input is untrusted here, so
// handlers validate before touching the store.

pub mod auth;
