// 🏭 Sector Catalogue
// The 20 fixed industry classification codes (A-T) and their display names.
//
// Stored data uses the single-letter code; pages show the display name.

use serde::{Deserialize, Serialize};

// ============================================================================
// SECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
}

impl Sector {
    /// All sectors in code order
    pub const ALL: [Sector; 20] = [
        Sector::A,
        Sector::B,
        Sector::C,
        Sector::D,
        Sector::E,
        Sector::F,
        Sector::G,
        Sector::H,
        Sector::I,
        Sector::J,
        Sector::K,
        Sector::L,
        Sector::M,
        Sector::N,
        Sector::O,
        Sector::P,
        Sector::Q,
        Sector::R,
        Sector::S,
        Sector::T,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Sector::A => "A",
            Sector::B => "B",
            Sector::C => "C",
            Sector::D => "D",
            Sector::E => "E",
            Sector::F => "F",
            Sector::G => "G",
            Sector::H => "H",
            Sector::I => "I",
            Sector::J => "J",
            Sector::K => "K",
            Sector::L => "L",
            Sector::M => "M",
            Sector::N => "N",
            Sector::O => "O",
            Sector::P => "P",
            Sector::Q => "Q",
            Sector::R => "R",
            Sector::S => "S",
            Sector::T => "T",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sector::A => "Agriculture,forestry and fishing",
            Sector::B => "Mining and quarrying",
            Sector::C => "Manufacturing",
            Sector::D => "Electricity, gas, steam",
            Sector::E => "Water supply, sewerage",
            Sector::F => "Construction",
            Sector::G => "Wholesale and retail trade",
            Sector::H => "Transportation",
            Sector::I => "Accommodation and food service activities",
            Sector::J => "Information and communication",
            Sector::K => "Financial and insurance",
            Sector::L => "Real estate",
            Sector::M => "Knowledge-based services",
            Sector::N => "Travel agent, cleaning",
            Sector::O => "Public administration, defence and comp. social",
            Sector::P => "Education",
            Sector::Q => "Human health and social work",
            Sector::R => "Arts, entertainment, recreation activities",
            Sector::S => "Other service activities",
            Sector::T => "Private households with hired help; households’ production of goods and services for their own use",
        }
    }

    /// Look up a sector by its single-letter code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Sector> {
        let code = code.trim();
        Sector::ALL
            .iter()
            .copied()
            .find(|s| s.code().eq_ignore_ascii_case(code))
    }

    /// Look up a sector by its exact display name
    pub fn from_display_name(name: &str) -> Option<Sector> {
        let name = name.trim();
        Sector::ALL.iter().copied().find(|s| s.display_name() == name)
    }

    /// Accept either a code or a display name.
    /// Older user rows stored display names instead of codes.
    pub fn parse(token: &str) -> Option<Sector> {
        Sector::from_code(token).or_else(|| Sector::from_display_name(token))
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Display names of all sectors, in code order
pub fn sector_choices() -> Vec<&'static str> {
    Sector::ALL.iter().map(|s| s.display_name()).collect()
}

/// Map a raw `industry_sector` value to its display name.
/// Unknown codes pass through unchanged.
pub fn label_for_code(code: &str) -> String {
    Sector::from_code(code)
        .map(|s| s.display_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

// ============================================================================
// SERIALIZATION (users.sectors column)
// ============================================================================

pub const SECTOR_DELIMITER: &str = ";";

/// Join sectors into the stored form, dropping repeats but keeping first-seen order
pub fn encode_sectors(sectors: &[Sector]) -> String {
    let mut seen: Vec<Sector> = Vec::with_capacity(sectors.len());
    for sector in sectors {
        if !seen.contains(sector) {
            seen.push(*sector);
        }
    }

    seen.iter()
        .map(|s| s.code())
        .collect::<Vec<_>>()
        .join(SECTOR_DELIMITER)
}

/// Parse the stored form. Unknown tokens are skipped.
pub fn decode_sectors(raw: &str) -> Vec<Sector> {
    let mut sectors = Vec::new();

    for token in raw.split(SECTOR_DELIMITER) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match Sector::parse(token) {
            Some(sector) if !sectors.contains(&sector) => sectors.push(sector),
            Some(_) => {}
            None => tracing::warn!(token, "skipping unknown sector in stored preferences"),
        }
    }

    sectors
}
