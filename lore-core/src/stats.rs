/// Outcome counts of one timing matrix rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub scanned: u64,
    pub accepted: u64,
    /// Decoded fine but failed the duration/length gate.
    pub rejected: u64,
    /// Could not be read or decoded at all.
    pub failed: u64,
}
