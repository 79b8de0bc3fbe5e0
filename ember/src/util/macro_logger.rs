// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use crate::ln::ChannelId;
use std::fmt;

pub(crate) struct DebugBytes<'a>(pub &'a [u8]);
impl<'a> fmt::Display for DebugBytes<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
		for i in self.0 {
			write!(f, "{:02x}", i)?;
		}
		Ok(())
	}
}

macro_rules! log_bytes {
	($obj: expr) => {
		crate::util::macro_logger::DebugBytes(&$obj[..])
	}
}

pub(crate) struct DebugChannelId<'a>(pub &'a ChannelId);
impl<'a> fmt::Display for DebugChannelId<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
		for i in (self.0).0.iter() {
			write!(f, "{:02x}", i)?;
		}
		Ok(())
	}
}

macro_rules! log_chan_id {
	($obj: expr) => {
		crate::util::macro_logger::DebugChannelId(&$obj)
	}
}

macro_rules! log_internal {
	($logger: expr, $lvl:expr, $($arg:tt)+) => (
		$logger.log(&crate::util::logger::Record::new($lvl, format_args!($($arg)+), module_path!(), file!(), line!()))
	);
}

macro_rules! log_error {
	($logger: expr, $($arg:tt)*) => (
		log_internal!($logger, crate::util::logger::Level::Error, $($arg)*);
	)
}

macro_rules! log_warn {
	($logger: expr, $($arg:tt)*) => (
		log_internal!($logger, crate::util::logger::Level::Warn, $($arg)*);
	)
}

macro_rules! log_info {
	($logger: expr, $($arg:tt)*) => (
		log_internal!($logger, crate::util::logger::Level::Info, $($arg)*);
	)
}

macro_rules! log_debug {
	($logger: expr, $($arg:tt)*) => (
		log_internal!($logger, crate::util::logger::Level::Debug, $($arg)*);
	)
}

macro_rules! log_trace {
	($logger: expr, $($arg:tt)*) => (
		log_internal!($logger, crate::util::logger::Level::Trace, $($arg)*);
	)
}
