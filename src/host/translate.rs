//! # Status / exit code translation.
//!
//! Pure, total mapping from the generic model ([`Status`], [`ExitCode`]) to the
//! host's [`StatusRecord`]. Nothing here can fail; only handing the record to
//! the host can.
//!
//! ## Exit code encoding
//! ```text
//! code == 0                    → win32 = NO_ERROR,                     specific = NO_ERROR
//! code != 0, service_specific  → win32 = ERROR_SERVICE_SPECIFIC_ERROR, specific = code
//! code != 0, !service_specific → win32 = code,                         specific = NO_ERROR
//! ```

use crate::host::record::{
    ERROR_SERVICE_SPECIFIC_ERROR, NO_ERROR, SERVICE_ACCEPT_PAUSE_CONTINUE,
    SERVICE_ACCEPT_PRESHUTDOWN, SERVICE_ACCEPT_SHUTDOWN, SERVICE_ACCEPT_STOP,
    SERVICE_WIN32_OWN_PROCESS, StatusRecord,
};
use crate::status::{AcceptedCommands, ExitCode, Status};

/// Builds the host status record for `status` carrying `exit`.
pub fn to_record(status: &Status, exit: &ExitCode) -> StatusRecord {
    let (win32_exit_code, service_specific_exit_code) = exit_fields(exit);
    StatusRecord {
        service_type: SERVICE_WIN32_OWN_PROCESS,
        current_state: status.state.as_raw(),
        controls_accepted: accepted_mask(status.accepted),
        win32_exit_code,
        service_specific_exit_code,
        checkpoint: status.checkpoint,
        wait_hint_ms: status.wait_hint.as_millis().min(u128::from(u32::MAX)) as u32,
    }
}

/// Host accept bit for each flag of [`AcceptedCommands`].
const ACCEPT_BITS: [(AcceptedCommands, u32); 4] = [
    (AcceptedCommands::STOP, SERVICE_ACCEPT_STOP),
    (AcceptedCommands::SHUTDOWN, SERVICE_ACCEPT_SHUTDOWN),
    (AcceptedCommands::PRESHUTDOWN, SERVICE_ACCEPT_PRESHUTDOWN),
    (AcceptedCommands::PAUSE_CONTINUE, SERVICE_ACCEPT_PAUSE_CONTINUE),
];

/// Composes the host's accepted-controls bitmask, one flag bit per command.
pub fn accepted_mask(accepted: AcceptedCommands) -> u32 {
    ACCEPT_BITS
        .iter()
        .filter(|(flag, _)| accepted.contains(*flag))
        .fold(0, |mask, (_, bit)| mask | bit)
}

/// Returns `(win32_exit_code, service_specific_exit_code)`.
fn exit_fields(exit: &ExitCode) -> (u32, u32) {
    if exit.code == 0 {
        (NO_ERROR, NO_ERROR)
    } else if exit.service_specific {
        (ERROR_SERVICE_SPECIFIC_ERROR, exit.code)
    } else {
        (exit.code, NO_ERROR)
    }
}
