//! End-to-end scenarios for the directory account manager live under
//! `tests/`.

#![forbid(unsafe_code)]
