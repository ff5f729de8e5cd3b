/// Counts from one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub discovered: usize,
    pub fetch_failed: usize,
    pub missing_coordinates: usize,
    pub collected: usize,
}

impl HarvestStats {
    pub fn skipped(&self) -> usize {
        self.fetch_failed + self.missing_coordinates
    }
}

impl std::fmt::Display for HarvestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Pool links found:      {}", self.discovered)?;
        writeln!(f, "  Failed to fetch:       {}", self.fetch_failed)?;
        writeln!(f, "  Without coordinates:   {}", self.missing_coordinates)?;
        writeln!(f, "  Saved:                 {}", self.collected)
    }
}
