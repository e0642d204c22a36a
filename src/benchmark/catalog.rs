/// A named benchmark instance with its size and, where published, the optimal objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub n: usize,
    pub known_optimal: Option<f64>,
}

const CATALOG: [CatalogEntry; 10] = [
    entry("nug5", 5, 50.0),
    entry("nug12", 12, 578.0),
    entry("nug14", 14, 1014.0),
    entry("nug15", 15, 1150.0),
    entry("nug20", 20, 2570.0),
    entry("nug30", 30, 6124.0),
    entry("chr12a", 12, 9552.0),
    entry("had12", 12, 1652.0),
    entry("tai12a", 12, 224416.0),
    entry("esc16a", 16, 68.0),
];

const fn entry(name: &'static str, n: usize, known_optimal: f64) -> CatalogEntry {
    CatalogEntry {
        name,
        n,
        known_optimal: Some(known_optimal),
    }
}

/// Every instance the harness knows about.
pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

pub fn instance_names() -> Vec<&'static str> {
    CATALOG.iter().map(|e| e.name).collect()
}

pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let nug5 = lookup("nug5").unwrap();
        assert_eq!(nug5.n, 5);
        assert_eq!(nug5.known_optimal, Some(50.0));
        assert!(lookup("nug99").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = instance_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog().len());
    }
}
