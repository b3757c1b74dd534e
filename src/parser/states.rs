//! Brazilian state lookup for slug fragments.
//!
//! Slugs encode the state right after the city ("...em-cristalandia-tocantins-...").
//! Most states are a single token, but a few span several tokens
//! ("mato-grosso-do-sul", "rio-grande-do-norte"). Those are disambiguated by
//! peeking at the remainder of the slug, mirroring the portal's own URL
//! conventions. This is a best-effort, lossy heuristic: a city whose name
//! happens to start with "mato" or "rio" can be misread, and no attempt is
//! made at real geocoding.

/// Slug fragment → (canonical name, UF code).
const STATES: &[(&str, &str, &str)] = &[
    ("acre", "Acre", "AC"),
    ("alagoas", "Alagoas", "AL"),
    ("amapa", "Amapá", "AP"),
    ("amazonas", "Amazonas", "AM"),
    ("bahia", "Bahia", "BA"),
    ("ceara", "Ceará", "CE"),
    ("distrito-federal", "Distrito Federal", "DF"),
    ("espirito-santo", "Espírito Santo", "ES"),
    ("goias", "Goiás", "GO"),
    ("maranhao", "Maranhão", "MA"),
    ("mato-grosso", "Mato Grosso", "MT"),
    ("mato-grosso-do-sul", "Mato Grosso do Sul", "MS"),
    ("minas-gerais", "Minas Gerais", "MG"),
    ("para", "Pará", "PA"),
    ("paraiba", "Paraíba", "PB"),
    ("parana", "Paraná", "PR"),
    ("pernambuco", "Pernambuco", "PE"),
    ("piaui", "Piauí", "PI"),
    ("rio-de-janeiro", "Rio de Janeiro", "RJ"),
    ("rio-grande-do-norte", "Rio Grande do Norte", "RN"),
    ("rio-grande-do-sul", "Rio Grande do Sul", "RS"),
    ("rondonia", "Rondônia", "RO"),
    ("roraima", "Roraima", "RR"),
    ("santa-catarina", "Santa Catarina", "SC"),
    ("sao-paulo", "São Paulo", "SP"),
    ("sergipe", "Sergipe", "SE"),
    ("tocantins", "Tocantins", "TO"),
];

/// Look up a single-token state fragment.
fn lookup(fragment: &str) -> Option<(&'static str, &'static str)> {
    STATES
        .iter()
        .find(|(slug, _, _)| *slug == fragment)
        .map(|(_, name, code)| (*name, *code))
}

/// Resolve a state from the first token after the city plus the rest of the
/// slug, handling the known multi-token state names.
///
/// Returns `None` when the fragment matches no known state.
pub fn resolve(first_token: &str, slug_remainder: &str) -> Option<(&'static str, &'static str)> {
    match first_token {
        "mato" if slug_remainder.contains("grosso-do-sul") => lookup("mato-grosso-do-sul"),
        "mato" if slug_remainder.contains("grosso") => lookup("mato-grosso"),
        "rio" if slug_remainder.contains("grande-do-norte") => lookup("rio-grande-do-norte"),
        "rio" if slug_remainder.contains("grande-do-sul") => lookup("rio-grande-do-sul"),
        "rio" if slug_remainder.contains("de-janeiro") => lookup("rio-de-janeiro"),
        "sao" if slug_remainder.contains("paulo") => lookup("sao-paulo"),
        "minas" if slug_remainder.contains("gerais") => lookup("minas-gerais"),
        "santa" if slug_remainder.contains("catarina") => lookup("santa-catarina"),
        "espirito" if slug_remainder.contains("santo") => lookup("espirito-santo"),
        "distrito" if slug_remainder.contains("federal") => lookup("distrito-federal"),
        token => lookup(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token_state() {
        assert_eq!(resolve("tocantins", ""), Some(("Tocantins", "TO")));
        assert_eq!(resolve("goias", ""), Some(("Goiás", "GO")));
    }

    #[test]
    fn test_mato_grosso_disambiguation() {
        assert_eq!(
            resolve("mato", "grosso-com-area-de-10-ha"),
            Some(("Mato Grosso", "MT"))
        );
        assert_eq!(
            resolve("mato", "grosso-do-sul-com-area-de-10-ha"),
            Some(("Mato Grosso do Sul", "MS"))
        );
    }

    #[test]
    fn test_rio_disambiguation() {
        assert_eq!(
            resolve("rio", "grande-do-norte-cod-x"),
            Some(("Rio Grande do Norte", "RN"))
        );
        assert_eq!(
            resolve("rio", "grande-do-sul-cod-x"),
            Some(("Rio Grande do Sul", "RS"))
        );
        assert_eq!(
            resolve("rio", "de-janeiro-cod-x"),
            Some(("Rio de Janeiro", "RJ"))
        );
    }

    #[test]
    fn test_unknown_fragment() {
        assert_eq!(resolve("gotham", ""), None);
        // "rio" with no recognized remainder is not a state on its own
        assert_eq!(resolve("rio", "verde-cod-x"), None);
    }
}
