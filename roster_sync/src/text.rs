// Small text helpers shared by the table layer and the roster code.

/// Lower-cases and removes the diacritics of the Latin letters found in
/// Portuguese text. Other characters are kept as they are.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ý' | 'ÿ' => 'y',
            x => x,
        })
        .collect()
}

/// Normalized form of a column header: trimmed and lower-cased.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Ordering key for person names: accents and case are ignored first,
/// the exact spelling breaks ties so that the order is total.
pub fn name_sort_key(name: &str) -> (String, String) {
    (fold_accents(name), name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_portuguese_letters() {
        assert_eq!(fold_accents("Órgão"), "orgao");
        assert_eq!(fold_accents("Secretário"), "secretario");
        assert_eq!(fold_accents("Conceição"), "conceicao");
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let mut names = vec!["Bruno", "Álvaro", "Ana", "amanda"];
        names.sort_by_key(|n| name_sort_key(n));
        assert_eq!(names, vec!["Álvaro", "amanda", "Ana", "Bruno"]);
    }
}
