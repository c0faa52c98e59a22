//! End-to-End Integration Tests
//!
//! These tests drive the complete binding pipeline: builder validation,
//! assertion signing and encryption, document signing, and the POST and
//! Redirect encoders, verifying the output with the fixture keys.

mod post_binding;
mod redirect_binding;
