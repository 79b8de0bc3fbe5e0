// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use bitcoin::blockdata::transaction::TxOut;

use std::cmp::Ordering;

/// Sorts outputs into the BIP 69 canonical order: ascending by value, then by scriptPubKey bytes,
/// with `tie_breaker` resolving ties (BOLT 3 orders otherwise-identical HTLC outputs by expiry).
pub fn sort_outputs<T, C: Fn(&T, &T) -> Ordering>(outputs: &mut Vec<(TxOut, T)>, tie_breaker: C) {
	outputs.sort_unstable_by(|a, b| {
		a.0.value.cmp(&b.0.value).then_with(|| {
			a.0.script_pubkey[..].cmp(&b.0.script_pubkey[..]).then_with(|| tie_breaker(&a.1, &b.1))
		})
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use bitcoin::blockdata::script::{Builder, Script};

	#[test]
	fn sort_output_by_value() {
		let txout1 = TxOut { script_pubkey: Builder::new().push_int(0).into_script(), value: 100 };
		let txout2 = TxOut { script_pubkey: Builder::new().push_int(0).into_script(), value: 99 };
		let mut outputs = vec![(txout1.clone(), "ignore"), (txout2.clone(), "ignore")];
		sort_outputs(&mut outputs, |_, _| unreachable!());
		assert_eq!(&outputs, &vec![(txout2, "ignore"), (txout1, "ignore")]);
	}

	#[test]
	fn sort_output_by_script() {
		let txout1 = TxOut { script_pubkey: Script::from(vec![1, 2, 3]), value: 100 };
		let txout2 = TxOut { script_pubkey: Script::from(vec![1, 2, 2]), value: 100 };
		let mut outputs = vec![(txout1.clone(), "ignore"), (txout2.clone(), "ignore")];
		sort_outputs(&mut outputs, |_, _| unreachable!());
		assert_eq!(&outputs, &vec![(txout2, "ignore"), (txout1, "ignore")]);
	}

	#[test]
	fn sort_output_tie_breaker() {
		let txout = TxOut { script_pubkey: Script::from(vec![1, 2, 3]), value: 100 };
		let mut outputs = vec![(txout.clone(), 420), (txout.clone(), 69)];
		sort_outputs(&mut outputs, |a, b| a.cmp(b));
		assert_eq!(&outputs, &vec![(txout.clone(), 69), (txout, 420)]);
	}
}
