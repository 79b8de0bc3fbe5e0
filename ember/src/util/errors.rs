// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Error types live here.

use std::fmt;

/// Indicates an error on the client's part (usually some variant of attempting to use too-low or
/// too-high values). These are delivered back to the originator of a channel command; the channel
/// itself continues unaffected.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum APIError {
	/// Indicates the API was wholly misused (see err for more). Cases where these can be returned
	/// are documented, but generally indicates some precondition of a function was violated.
	APIMisuseError {
		/// A human-readable error message
		err: String,
	},
	/// Due to a high feerate, we were unable to complete the request.
	/// For example, this may be returned if the feerate implies we cannot open a channel at the
	/// requested value, but opening a larger channel would succeed.
	FeeRateTooHigh {
		/// A human-readable error message
		err: String,
		/// The feerate which was too high.
		feerate: u32,
	},
	/// We were unable to complete the request as the Channel required to do so is unable to
	/// complete the request (or was not found). This can take many forms, including disconnected
	/// peer, channel at capacity, channel shutting down, etc.
	ChannelUnavailable {
		/// A human-readable error message
		err: String,
	},
	/// The requested amount could not be afforded while respecting the channel reserve and
	/// pending fees.
	InsufficientBalance {
		/// A human-readable error message
		err: String,
		/// The largest amount, in millisatoshi, which could currently be sent.
		available_msat: u64,
	},
	/// The on-chain wallet failed to provide or process a transaction.
	WalletFailure {
		/// A human-readable error message
		err: String,
	},
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			APIError::APIMisuseError { ref err } => write!(f, "Misuse error: {}", err),
			APIError::FeeRateTooHigh { ref err, ref feerate } => write!(f, "{} feerate: {}", err, feerate),
			APIError::ChannelUnavailable { ref err } => write!(f, "Channel unavailable: {}", err),
			APIError::InsufficientBalance { ref err, ref available_msat } => write!(f, "{} available: {} msat", err, available_msat),
			APIError::WalletFailure { ref err } => write!(f, "Wallet failure: {}", err),
		}
	}
}
