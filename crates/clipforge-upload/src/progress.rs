//! Overall progress milestones for one upload attempt.

pub const STARTED: u8 = 2;
pub const PRESIGNED: u8 = 10;
/// Upper end of the range the storage PUT is mapped into.
pub const TRANSFER_END: u8 = 85;
pub const TRANSFERRED: u8 = 88;
pub const REGISTERED: u8 = 92;
pub const DONE: u8 = 100;

/// Map PUT byte progress into `[PRESIGNED, TRANSFER_END]`.
pub fn transfer_progress(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return TRANSFER_END;
    }
    let fraction = sent.min(total) as f64 / total as f64;
    let span = f64::from(TRANSFER_END - PRESIGNED);
    PRESIGNED + (fraction * span).round() as u8
}
