//! Robot link boundary.
//!
//! The control core does not own a transport or wire protocol. Everything
//! it needs from the outside world is behind this trait: an inbound scan
//! source and an outbound command sink. The surrounding process decides
//! what actually sits behind it (the built-in corridor simulator, a serial
//! driver, a middleware bridge).

use crate::command::VelocityCommand;
use crate::error::Result;
use crate::scan::ScanFrame;

/// Inbound scans, outbound velocity commands.
pub trait RobotLink: Send {
    /// Poll for a newly captured scan. Non-blocking: returns `Ok(None)`
    /// when no frame is ready.
    fn recv_scan(&mut self) -> Result<Option<ScanFrame>>;

    /// Deliver a velocity command to the actuation side. The link is
    /// responsible for any periodic re-delivery the hardware needs; the
    /// core does not retry.
    fn send_velocity(&mut self, cmd: VelocityCommand) -> Result<()>;

    /// Deliver an immediate stop.
    fn send_stop(&mut self) -> Result<()> {
        self.send_velocity(VelocityCommand::stop())
    }
}
