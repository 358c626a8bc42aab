//! Call and dispatch counters
//!
//! Recorded through the `metrics` facade; the Prometheus exporter installed
//! by the server renders them. Without a recorder these calls are no-ops.

use metrics::{counter, describe_counter};

pub const CALLS_DISPATCHED: &str = "outbound_calls_dispatched_total";
pub const DISPATCH_FAILURES: &str = "outbound_call_dispatch_failures_total";
pub const CALLS_DIALED: &str = "outbound_calls_dialed_total";
pub const DIAL_FAILURES: &str = "outbound_call_dial_failures_total";
pub const TRANSFERS: &str = "outbound_call_transfers_total";
pub const HANGUPS: &str = "outbound_call_hangups_total";

pub fn describe() {
    describe_counter!(CALLS_DISPATCHED, "Call jobs dispatched from the operator form");
    describe_counter!(DISPATCH_FAILURES, "Dispatch attempts that failed");
    describe_counter!(CALLS_DIALED, "Outbound calls answered by the callee");
    describe_counter!(DIAL_FAILURES, "Outbound calls that failed to connect");
    describe_counter!(TRANSFERS, "Transfers to a human agent, by outcome");
    describe_counter!(HANGUPS, "Calls torn down by the agent");
}

pub fn record_dispatch(success: bool) {
    if success {
        counter!(CALLS_DISPATCHED).increment(1);
    } else {
        counter!(DISPATCH_FAILURES).increment(1);
    }
}

pub fn record_dial(success: bool) {
    if success {
        counter!(CALLS_DIALED).increment(1);
    } else {
        counter!(DIAL_FAILURES).increment(1);
    }
}

pub fn record_transfer(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(TRANSFERS, "outcome" => outcome).increment(1);
}

pub fn record_hangup() {
    counter!(HANGUPS).increment(1);
}
