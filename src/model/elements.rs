// src/model/elements.rs

/// (symbol, atomic number, standard atomic mass in amu)
const ELEMENTS: &[(&str, u32, f64)] = &[
    // --- Period 1 ---
    ("H", 1, 1.008), ("He", 2, 4.0026),
    // --- Period 2 ---
    ("Li", 3, 6.94), ("Be", 4, 9.0122), ("B", 5, 10.81), ("C", 6, 12.011),
    ("N", 7, 14.007), ("O", 8, 15.999), ("F", 9, 18.998), ("Ne", 10, 20.180),
    // --- Period 3 ---
    ("Na", 11, 22.990), ("Mg", 12, 24.305), ("Al", 13, 26.982), ("Si", 14, 28.085),
    ("P", 15, 30.974), ("S", 16, 32.06), ("Cl", 17, 35.45), ("Ar", 18, 39.948),
    // --- Period 4 ---
    ("K", 19, 39.098), ("Ca", 20, 40.078), ("Sc", 21, 44.956), ("Ti", 22, 47.867),
    ("V", 23, 50.942), ("Cr", 24, 51.996), ("Mn", 25, 54.938), ("Fe", 26, 55.845),
    ("Co", 27, 58.933), ("Ni", 28, 58.693), ("Cu", 29, 63.546), ("Zn", 30, 65.38),
    ("Ga", 31, 69.723), ("Ge", 32, 72.630), ("As", 33, 74.922), ("Se", 34, 78.971),
    ("Br", 35, 79.904), ("Kr", 36, 83.798),
    // --- Period 5 (Selected) ---
    ("Mo", 42, 95.95), ("Pd", 46, 106.42), ("Ag", 47, 107.87), ("Sn", 50, 118.71),
    // --- Period 6 (Selected) ---
    ("W", 74, 183.84), ("Pt", 78, 195.08), ("Au", 79, 196.97),
];

/// Returns the atomic number (Z) for a given element symbol
pub fn atomic_number(symbol: &str) -> Option<u32> {
    ELEMENTS.iter().find(|(s, _, _)| *s == symbol).map(|(_, z, _)| *z)
}

/// Returns the standard atomic mass (amu) for a given element symbol
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ELEMENTS.iter().find(|(s, _, _)| *s == symbol).map(|(_, _, m)| *m)
}

/// Returns the element symbol for an atomic number
pub fn element_symbol(z: u32) -> Option<&'static str> {
    ELEMENTS.iter().find(|(_, n, _)| *n == z).map(|(s, _, _)| *s)
}

/// Accepts either an element symbol ("C") or an atomic number ("6").
pub fn normalize_element(token: &str) -> Option<&'static str> {
    if let Ok(z) = token.parse::<u32>() {
        return element_symbol(z);
    }
    ELEMENTS.iter().find(|(s, _, _)| *s == token).map(|(s, _, _)| *s)
}

/// Closest tabulated element to `mass`, if any lies within `tol` amu.
pub fn element_by_mass(mass: f64, tol: f64) -> Option<&'static str> {
    ELEMENTS
        .iter()
        .map(|(s, _, m)| (*s, (m - mass).abs()))
        .filter(|(_, d)| *d <= tol)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_ways() {
        assert_eq!(atomic_number("C"), Some(6));
        assert_eq!(atomic_number("N"), Some(7));
        assert_eq!(element_symbol(5), Some("B"));
        assert_eq!(atomic_number("Xx"), None);
    }

    #[test]
    fn test_normalize_accepts_numbers() {
        assert_eq!(normalize_element("6"), Some("C"));
        assert_eq!(normalize_element("Au"), Some("Au"));
        assert_eq!(normalize_element("au"), None);
    }

    #[test]
    fn test_masses() {
        assert!((atomic_mass("C").unwrap() - 12.011).abs() < 1e-9);
    }

    #[test]
    fn test_element_by_mass() {
        assert_eq!(element_by_mass(12.0107, 0.05), Some("C"));
        assert_eq!(element_by_mass(10.81, 0.05), Some("B"));
        assert_eq!(element_by_mass(500.0, 0.05), None);
    }
}
