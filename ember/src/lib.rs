// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

#![crate_name = "ember"]

//! Ember, a Lightning channel engine in library form.
//!
//! The heart of the crate is the per-channel state machine in [`ln::channel`]: a finite-state
//! actor which consumes peer messages, user commands, blockchain events and timer ticks, and
//! emits wire messages, database writes and watch requests. Commitment transactions are built
//! deterministically by [`ln::commitment`] from the shared [`ln::channel::Commitments`] record,
//! and [`ln::onchain`] turns a published commitment (ours, theirs, or a revoked one) into the
//! full set of claim and penalty transactions.
//!
//! There is no built-in threading/execution environment beyond the minimal one-thread-per-channel
//! host in [`ln::channel_actor`], and no built-in networking, routing or chain access: the host
//! supplies those through the traits in [`chain`] and [`db`]. This makes the crate suitable for
//! tight integration into an existing node or wallet process.

#![cfg_attr(not(any(test, feature = "_test_utils")), deny(missing_docs))]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

#![allow(ellipsis_inclusive_range_patterns)]

extern crate bitcoin;
#[cfg(test)]
extern crate hex;

#[macro_use]
pub mod util;
pub mod chain;
pub mod db;
pub mod ln;
pub mod routing;
