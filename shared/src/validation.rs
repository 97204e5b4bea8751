//! Validation utilities for the Entrepot Maritime platform
//!
//! Includes the Senegal-specific formats the business runs on (phone
//! numbers, product reference codes, document numbering).

use rust_decimal::Decimal;

// ============================================================================
// Quantity and money validations
// ============================================================================

/// Validate that a quantity is strictly positive
pub fn validate_quantite(quantite: Decimal) -> Result<(), &'static str> {
    if quantite <= Decimal::ZERO {
        return Err("La quantite doit etre superieure a 0");
    }
    Ok(())
}

/// Validate that a price is non-negative
pub fn validate_prix(prix: Decimal) -> Result<(), &'static str> {
    if prix < Decimal::ZERO {
        return Err("Le prix ne peut pas etre negatif");
    }
    Ok(())
}

/// Validate that a VAT rate is a percentage in [0, 100]
pub fn validate_taux_tva(taux: Decimal) -> Result<(), &'static str> {
    if taux < Decimal::ZERO || taux > Decimal::from(100) {
        return Err("Le taux de TVA doit etre compris entre 0 et 100");
    }
    Ok(())
}

// ============================================================================
// General validations
// ============================================================================

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err("Format email invalide")
    }
}

/// Validate a Senegalese phone number
/// Accepts: 771234567, 77 123 45 67, +221771234567, 221771234567
pub fn validate_telephone(telephone: &str) -> Result<(), &'static str> {
    let cleaned: String = telephone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Format telephone invalide (ex: 77 123 45 67)");
    }
    // National: 9 digits; international: 221 prefix plus 9 digits
    if digits.len() == 9 {
        return Ok(());
    }
    if digits.len() == 12 && digits.starts_with("221") {
        return Ok(());
    }
    Err("Format telephone invalide (ex: 77 123 45 67)")
}

/// Validate a product reference code
/// Format: 2-4 uppercase letters, dash, 3-6 digits (e.g. `RIZ-1025`)
pub fn validate_reference_produit(reference: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = reference.split('-').collect();
    if parts.len() != 2 {
        return Err("Format reference invalide (ex: RIZ-1025)");
    }
    let lettres = parts[0];
    let chiffres = parts[1];
    if !(2..=4).contains(&lettres.len()) || !lettres.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Format reference invalide (ex: RIZ-1025)");
    }
    if !(3..=6).contains(&chiffres.len()) || !chiffres.chars().all(|c| c.is_ascii_digit()) {
        return Err("Format reference invalide (ex: RIZ-1025)");
    }
    Ok(())
}

/// Validate that a free-text required field is non-empty
pub fn validate_non_vide(valeur: &str, champ: &'static str) -> Result<(), &'static str> {
    if valeur.trim().is_empty() {
        return Err(champ);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantite() {
        assert!(validate_quantite(Decimal::from(1)).is_ok());
        assert!(validate_quantite(Decimal::new(5, 1)).is_ok()); // 0.5
        assert!(validate_quantite(Decimal::ZERO).is_err());
        assert!(validate_quantite(Decimal::from(-3)).is_err());
    }

    #[test]
    fn test_validate_prix() {
        assert!(validate_prix(Decimal::ZERO).is_ok());
        assert!(validate_prix(Decimal::from(250_000)).is_ok());
        assert!(validate_prix(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_taux_tva() {
        assert!(validate_taux_tva(Decimal::ZERO).is_ok());
        assert!(validate_taux_tva(Decimal::from(18)).is_ok());
        assert!(validate_taux_tva(Decimal::from(100)).is_ok());
        assert!(validate_taux_tva(Decimal::from(101)).is_err());
        assert!(validate_taux_tva(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("compta@its-logistique.sn").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
    }

    #[test]
    fn test_validate_telephone_valid() {
        assert!(validate_telephone("771234567").is_ok());
        assert!(validate_telephone("77 123 45 67").is_ok());
        assert!(validate_telephone("+221771234567").is_ok());
        assert!(validate_telephone("221771234567").is_ok());
    }

    #[test]
    fn test_validate_telephone_invalid() {
        assert!(validate_telephone("12345").is_err());
        assert!(validate_telephone("7712345678901").is_err());
        assert!(validate_telephone("abcdefghi").is_err());
    }

    #[test]
    fn test_validate_reference_produit() {
        assert!(validate_reference_produit("RIZ-1025").is_ok());
        assert!(validate_reference_produit("HU-123456").is_ok());
        assert!(validate_reference_produit("SUCR-001").is_ok());
        assert!(validate_reference_produit("riz-1025").is_err());
        assert!(validate_reference_produit("R-1025").is_err());
        assert!(validate_reference_produit("RIZ-12").is_err());
        assert!(validate_reference_produit("RIZ1025").is_err());
    }

    #[test]
    fn test_validate_non_vide() {
        assert!(validate_non_vide("Dakar", "ville").is_ok());
        assert!(validate_non_vide("  ", "ville").is_err());
    }
}
