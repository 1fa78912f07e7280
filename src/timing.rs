//! Delays the device needs between commands. A command sent before the
//! previous one has settled is dropped without any indication.

use std::time::Duration;

/// After selecting a multimeter mode.
pub const MODE_SETTLE: Duration = Duration::from_millis(400);

/// After switching the mV/V or mA/A input relay.
pub const RELAY_SETTLE: Duration = Duration::from_millis(780);

/// After enabling auto ranging.
pub const AUTO_RANGE_SETTLE: Duration = Duration::from_millis(800);

/// After each step of the range cycle.
pub const RANGE_CYCLE_SETTLE: Duration = Duration::from_millis(400);

/// Minimum gap between two commands on the wire.
pub const RATE_LIMIT: Duration = Duration::from_millis(1);

/// Upper bound of range cycle commands for a single range selection.
pub const MAX_RANGE_CYCLES: usize = 20;
