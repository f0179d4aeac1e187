//! National Provider Identifier validation.

#![deny(unsafe_code)]

/// Card-issuer prefix implied in front of every NPI for the check digit.
const NPI_PREFIX: &str = "80840";

/// True when `npi` is ten digits whose last digit is the Luhn check digit of
/// `80840` followed by the first nine.
pub fn is_valid_npi(npi: &str) -> bool {
    let npi = npi.trim();
    if npi.len() != 10 || !npi.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn_valid(&format!("{NPI_PREFIX}{npi}"))
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_npis() {
        assert!(is_valid_npi("1234567893"));
        assert!(is_valid_npi(" 1234567893 "));
        assert!(!is_valid_npi("1234567890"));
        assert!(!is_valid_npi("123456789"));
        assert!(!is_valid_npi("12345678a3"));
        assert!(!is_valid_npi(""));
    }
}
