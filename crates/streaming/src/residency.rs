/// Lifecycle of a cached tile.
///
/// Requested -> Resident | Failed. A slot being reused resets it to Requested for the
/// new identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    /// Queued or in flight.
    Requested,
    /// Decoded and drawable.
    Resident,
    /// Fetch or decode failed; kept so the identifier is not retried.
    Failed,
}

impl ResidencyState {
    pub fn is_settled(self) -> bool {
        !matches!(self, ResidencyState::Requested)
    }
}

impl Default for ResidencyState {
    fn default() -> Self {
        ResidencyState::Requested
    }
}
