//! # Set of commands a service is willing to receive.
//!
//! [`AcceptedCommands`] is a small bit set. Composition with `|` is
//! order-independent and idempotent, so `STOP | SHUTDOWN | STOP` equals
//! `SHUTDOWN | STOP`.
//!
//! `Interrogate` is not part of the set: the host may always send it.

use bitflags::bitflags;

use crate::status::ControlCommand;

bitflags! {
    /// Commands the service accepts in its current state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AcceptedCommands: u8 {
        const STOP           = 0b0000_0001;
        const SHUTDOWN       = 0b0000_0010;
        const PRESHUTDOWN    = 0b0000_0100;
        /// Covers both `Pause` and `Continue`.
        const PAUSE_CONTINUE = 0b0000_1000;
    }
}

impl Default for AcceptedCommands {
    fn default() -> Self {
        Self::empty()
    }
}

impl AcceptedCommands {
    /// Returns `true` if the host may send `cmd` while this set is in effect.
    pub fn accepts(self, cmd: ControlCommand) -> bool {
        match cmd {
            ControlCommand::Interrogate => true,
            ControlCommand::Stop => self.contains(Self::STOP),
            ControlCommand::Shutdown => self.contains(Self::SHUTDOWN),
            ControlCommand::PreShutdown => self.contains(Self::PRESHUTDOWN),
            ControlCommand::Pause | ControlCommand::Continue => {
                self.contains(Self::PAUSE_CONTINUE)
            }
            ControlCommand::Other(_) => false,
        }
    }
}
