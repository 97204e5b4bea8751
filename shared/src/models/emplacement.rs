//! Storage location models
//!
//! The warehouse is laid out as zones A-D, five aisles per zone, ten
//! positions per aisle. Codes are `Z-AA-PP`, e.g. `B-03-07`.

use serde::{Deserialize, Serialize};

pub const ZONES: [char; 4] = ['A', 'B', 'C', 'D'];
pub const ALLEES_PAR_ZONE: u8 = 5;
pub const POSITIONS_PAR_ALLEE: u8 = 10;
pub const CAPACITE_DEFAUT: u32 = 100;

/// A storage location in the warehouse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Emplacement {
    /// Location code, `Z-AA-PP`
    pub code: String,
    pub zone: char,
    pub allee: u8,
    pub position: u8,
    pub capacite: u32,
}

impl Emplacement {
    pub fn code_for(zone: char, allee: u8, position: u8) -> String {
        format!("{}-{:02}-{:02}", zone, allee, position)
    }
}

/// Generate the full static location grid
pub fn generer_emplacements() -> Vec<Emplacement> {
    let mut emplacements =
        Vec::with_capacity(ZONES.len() * ALLEES_PAR_ZONE as usize * POSITIONS_PAR_ALLEE as usize);
    for &zone in &ZONES {
        for allee in 1..=ALLEES_PAR_ZONE {
            for position in 1..=POSITIONS_PAR_ALLEE {
                emplacements.push(Emplacement {
                    code: Emplacement::code_for(zone, allee, position),
                    zone,
                    allee,
                    position,
                    capacite: CAPACITE_DEFAUT,
                });
            }
        }
    }
    emplacements
}

/// Check that a code matches the `Z-AA-PP` grid
pub fn est_code_valide(code: &str) -> bool {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 1 || parts[1].len() != 2 || parts[2].len() != 2 {
        return false;
    }
    let zone_ok = parts[0].chars().next().is_some_and(|c| ZONES.contains(&c));
    let allee_ok = parts[1]
        .parse::<u8>()
        .is_ok_and(|n| (1..=ALLEES_PAR_ZONE).contains(&n));
    let position_ok = parts[2]
        .parse::<u8>()
        .is_ok_and(|n| (1..=POSITIONS_PAR_ALLEE).contains(&n));
    zone_ok && allee_ok && position_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size() {
        let emplacements = generer_emplacements();
        assert_eq!(emplacements.len(), 200);
    }

    #[test]
    fn test_code_format() {
        assert_eq!(Emplacement::code_for('A', 1, 1), "A-01-01");
        assert_eq!(Emplacement::code_for('D', 5, 10), "D-05-10");
    }

    #[test]
    fn test_generated_codes_are_valid() {
        for emplacement in generer_emplacements() {
            assert!(est_code_valide(&emplacement.code), "{}", emplacement.code);
        }
    }

    #[test]
    fn test_invalid_codes() {
        assert!(!est_code_valide("E-01-01")); // unknown zone
        assert!(!est_code_valide("A-06-01")); // aisle out of range
        assert!(!est_code_valide("A-01-11")); // position out of range
        assert!(!est_code_valide("A-1-1")); // missing padding
        assert!(!est_code_valide("A0101"));
        assert!(!est_code_valide(""));
    }
}
