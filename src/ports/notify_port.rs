//! Signal notification port trait.

use crate::domain::error::SigtraderError;
use crate::domain::signal::CurrentSignal;

/// Delivers trade proposals to an external audience.
pub trait NotifyPort {
    fn notify(&mut self, signal: &CurrentSignal) -> Result<(), SigtraderError>;
}
