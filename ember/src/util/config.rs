// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Various user-configurable channel limits and settings which applications
//! may set when constructing channels.

/// Configuration we set when applicable.
///
/// Default::default() provides sane defaults.
#[derive(Copy, Clone, Debug)]
pub struct ChannelHandshakeConfig {
	/// Confirmations we will wait for before considering the channel locked in.
	/// Applied only for inbound channels (see [`ChannelHandshakeLimits::max_minimum_depth`] for the
	/// equivalent limit applied to outbound channels).
	///
	/// Default value: 6.
	pub minimum_depth: u32,
	/// Set to the number of blocks we require our counterparty to wait to claim their money (ie
	/// the number of blocks we have to punish our counterparty if they broadcast a revoked
	/// transaction).
	///
	/// Default value: 720 (12 hours of blocks at 10-minute intervals).
	pub our_to_self_delay: u16,
	/// Set to the smallest value HTLC we will accept to process.
	///
	/// Default value: 1. If the value is less than 1, it is ignored and set to 1, as is
	/// required by the protocol.
	pub our_htlc_minimum_msat: u64,
	/// The portion, in hundredths of a percent, of the channel value we will keep as our channel
	/// reserve requirement on the counterparty's balance.
	///
	/// Default value: 100 (1%).
	pub their_channel_reserve_proportional_basis_points: u16,
	/// The maximum number of HTLCs we will accept in flight from our counterparty at any time.
	/// Bounded above by the protocol maximum of 483.
	///
	/// Default value: 30.
	pub our_max_accepted_htlcs: u16,
	/// The maximum total value of HTLCs we will accept in flight from our counterparty, in
	/// millisatoshi.
	///
	/// Default value: 10% of the channel value.
	pub our_max_htlc_value_in_flight_proportional_basis_points: u16,
}

impl Default for ChannelHandshakeConfig {
	fn default() -> ChannelHandshakeConfig {
		ChannelHandshakeConfig {
			minimum_depth: 6,
			our_to_self_delay: 720,
			our_htlc_minimum_msat: 1,
			their_channel_reserve_proportional_basis_points: 100,
			our_max_accepted_htlcs: 30,
			our_max_htlc_value_in_flight_proportional_basis_points: 1000,
		}
	}
}

/// Optional channel limits which are applied during channel creation.
///
/// These limits are only applied to our counterparty's limits, not our own.
///
/// Any parameter equal to 0 or MAX is effectively unlimited.
#[derive(Copy, Clone, Debug)]
pub struct ChannelHandshakeLimits {
	/// Minimum allowed satoshis when a channel is funded. This is supplied by the sender and so
	/// only applies to inbound channels.
	///
	/// Default value: 1000.
	pub min_funding_satoshis: u64,
	/// The remote node sets a limit on the minimum size of HTLCs we can send to them. This allows
	/// you to limit the maximum minimum-size they can require.
	///
	/// Default value: u64::max_value.
	pub max_htlc_minimum_msat: u64,
	/// The remote node sets a limit on the maximum value of pending HTLCs to them at any given
	/// time to limit their funds exposure to HTLCs. This allows you to set a minimum such value.
	///
	/// Default value: 0.
	pub min_max_htlc_value_in_flight_msat: u64,
	/// The remote node will require we keep a certain amount in direct payment to ourselves at all
	/// time, ensuring that we are able to be punished if we broadcast an old state. This allows to
	/// you limit the amount which we will have to keep to ourselves (and cannot use for HTLCs).
	///
	/// Default value: u64::max_value.
	pub max_channel_reserve_satoshis: u64,
	/// The remote node sets a limit on the maximum number of pending HTLCs to them at any given
	/// time. This allows you to set a minimum such value.
	///
	/// Default value: 0.
	pub min_max_accepted_htlcs: u16,
	/// Outbound channels: before our funding transaction confirms the channel is unusable; this
	/// sets the maximum number of confirmations we will let our counterparty require.
	///
	/// Default value: 144, or roughly one day and only applies to outbound channels.
	pub max_minimum_depth: u32,
	/// Set to force the incoming channel to match our announced channel preference in
	/// ChannelConfig.
	///
	/// Default value: true, to make the default that no announced channels are possible (which is
	/// appropriate for any nodes which are not online very reliably).
	pub force_announced_channel_preference: bool,
}

impl Default for ChannelHandshakeLimits {
	fn default() -> Self {
		ChannelHandshakeLimits {
			min_funding_satoshis: 1000,
			max_htlc_minimum_msat: <u64>::max_value(),
			min_max_htlc_value_in_flight_msat: 0,
			max_channel_reserve_satoshis: <u64>::max_value(),
			min_max_accepted_htlcs: 0,
			max_minimum_depth: 144,
			force_announced_channel_preference: true,
		}
	}
}

/// The tolerance applied when validating an `update_fee` proposed by the channel funder, as a
/// pair of ratios against our own current feerate estimate.
///
/// A proposed feerate below `ratio_low` times our estimate is rejected outright (the funder is
/// trying to cheapen the commitment below what we consider safe to confirm); a proposed feerate
/// above `ratio_high` times our estimate is accepted anyway, as overpaying only hurts the funder.
#[derive(Copy, Clone, Debug)]
pub struct FeeTolerance {
	/// Lower multiplier on our feerate estimate below which a proposed feerate is rejected.
	pub ratio_low: f64,
	/// Upper multiplier on our feerate estimate above which a proposed feerate is still accepted,
	/// merely logged.
	pub ratio_high: f64,
}

impl Default for FeeTolerance {
	fn default() -> Self {
		FeeTolerance { ratio_low: 0.5, ratio_high: 10.0 }
	}
}

/// Top-level config which holds ChannelHandshakeLimits and ChannelHandshakeConfig.
///
/// Default::default() provides sane defaults for most configurations.
#[derive(Copy, Clone, Debug)]
pub struct NodeConfig {
	/// The genesis hash of the chain channels live on; open_channel messages for any other
	/// chain are rejected.
	pub chain_hash: bitcoin::hash_types::BlockHash,
	/// Channel config that we propose to our counterparty.
	pub own_channel_config: ChannelHandshakeConfig,
	/// Limits applied to our counterparty's proposed channel config settings.
	pub peer_channel_config_limits: ChannelHandshakeLimits,
	/// Tolerance applied when the funder proposes a feerate update.
	pub fee_tolerance: FeeTolerance,
	/// The lowest feerate, in satoshi per kiloweight, we will accept in an `update_fee`: anything
	/// below this is assumed not to propagate through the mempool.
	pub min_relay_feerate_per_kw: u32,
	/// Number of timer ticks (see `ChannelEvent::Timer`) we allow a channel to spend waiting for
	/// its funding transaction to confirm before giving up on it.
	pub channel_open_timeout_ticks: u32,
	/// Number of confirmations required on a closing transaction before the channel is considered
	/// fully closed and forgotten.
	pub closing_tx_min_depth: u32,
	/// The highest feature bit we will allow an invoice we construct to set. Construction of an
	/// invoice with any feature bit at or above this index fails.
	pub max_invoice_feature_bit: usize,
}

impl Default for NodeConfig {
	fn default() -> Self {
		NodeConfig {
			chain_hash: bitcoin::blockdata::constants::genesis_block(bitcoin::Network::Bitcoin).block_hash(),
			own_channel_config: ChannelHandshakeConfig::default(),
			peer_channel_config_limits: ChannelHandshakeLimits::default(),
			fee_tolerance: FeeTolerance::default(),
			min_relay_feerate_per_kw: 253,
			channel_open_timeout_ticks: 2016,
			closing_tx_min_depth: 6,
			max_invoice_feature_bit: 1024,
		}
	}
}
