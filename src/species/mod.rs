//! Species-name resolution via weighted keyword matching.
//!
//! The detection model only knows the generic "bird" class, but captures are
//! often annotated with free-text labels (external classifiers, user notes).
//! The resolver maps such labels onto a fixed table of common backyard
//! species through case-insensitive substring scoring.

use crate::constants::species::{
    COMMON_NAME_SCORE, KEYWORD_SCORE, SCIENTIFIC_NAME_SCORE, UNKNOWN,
};

/// A species record in the static table. Loaded once, read-only.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesEntry {
    /// Display name.
    pub name: &'static str,
    /// Scientific (Latin) name.
    pub scientific_name: &'static str,
    /// Common names across languages.
    pub common_names: &'static [&'static str],
    /// Loose matching keywords.
    pub keywords: &'static [&'static str],
}

/// Static species table, ordered; ties are broken by table order.
pub const SPECIES_TABLE: &[SpeciesEntry] = &[
    SpeciesEntry {
        name: "Sabiá-laranjeira",
        scientific_name: "Turdus rufiventris",
        common_names: &["Rufous-bellied Thrush", "Sabiá", "Sabiá-laranjeira"],
        keywords: &["thrush", "turdus", "sabia"],
    },
    SpeciesEntry {
        name: "Bem-te-vi",
        scientific_name: "Pitangus sulphuratus",
        common_names: &["Great Kiskadee", "Bem-te-vi", "Bentevi"],
        keywords: &["kiskadee", "flycatcher", "bentevi"],
    },
    SpeciesEntry {
        name: "João-de-barro",
        scientific_name: "Furnarius rufus",
        common_names: &["Rufous Hornero", "João-de-barro", "Hornero"],
        keywords: &["hornero", "ovenbird", "joao"],
    },
    SpeciesEntry {
        name: "Pardal",
        scientific_name: "Passer domesticus",
        common_names: &["House Sparrow", "Pardal"],
        keywords: &["sparrow", "finch", "pardal"],
    },
    SpeciesEntry {
        name: "Canário-da-terra",
        scientific_name: "Sicalis flaveola",
        common_names: &["Saffron Finch", "Canário-da-terra"],
        keywords: &["finch", "canary", "saffron"],
    },
    SpeciesEntry {
        name: "Beija-flor",
        scientific_name: "Trochilidae",
        common_names: &["Hummingbird", "Beija-flor", "Colibri"],
        keywords: &["hummingbird", "colibri", "beijaflor"],
    },
    SpeciesEntry {
        name: "Rolinha",
        scientific_name: "Columbina talpacoti",
        common_names: &["Ruddy Ground Dove", "Rolinha", "Rolinha-roxa"],
        keywords: &["dove", "ground dove", "rolinha"],
    },
    SpeciesEntry {
        name: "Sanhaço",
        scientific_name: "Tangara sayaca",
        common_names: &["Sayaca Tanager", "Sanhaço", "Sanhaço-cinzento"],
        keywords: &["tanager", "sanhaco", "sayaca"],
    },
    SpeciesEntry {
        name: "Tico-tico",
        scientific_name: "Zonotrichia capensis",
        common_names: &["Rufous-collared Sparrow", "Tico-tico"],
        keywords: &["sparrow", "zonotrichia", "tico"],
    },
    SpeciesEntry {
        name: "Corruíra",
        scientific_name: "Troglodytes musculus",
        common_names: &["Southern House Wren", "Corruíra", "Garrincha"],
        keywords: &["wren", "corruira", "house wren"],
    },
    SpeciesEntry {
        name: "Pica-pau",
        scientific_name: "Picidae",
        common_names: &["Woodpecker", "Pica-pau"],
        keywords: &["woodpecker", "picapau", "picidae"],
    },
    SpeciesEntry {
        name: "Andorinha",
        scientific_name: "Hirundinidae",
        common_names: &["Swallow", "Andorinha"],
        keywords: &["swallow", "martin", "andorinha"],
    },
    SpeciesEntry {
        name: "Pomba",
        scientific_name: "Columba livia",
        common_names: &["Rock Pigeon", "Pomba", "Pombo"],
        keywords: &["pigeon", "dove", "pomba"],
    },
    SpeciesEntry {
        name: "Quero-quero",
        scientific_name: "Vanellus chilensis",
        common_names: &["Southern Lapwing", "Quero-quero"],
        keywords: &["lapwing", "plover", "queroquero"],
    },
    SpeciesEntry {
        name: "Sabiá-do-campo",
        scientific_name: "Mimus saturninus",
        common_names: &["Chalk-browed Mockingbird", "Sabiá-do-campo"],
        keywords: &["mockingbird", "mimus", "sabia"],
    },
];

/// Generic bird-related keywords for the coarse `is_bird_label` check.
const GENERAL_BIRD_KEYWORDS: &[&str] = &[
    "bird", "ave", "fowl", "cock", "hen", "passaro", "pássaro", "feather", "wing", "beak", "nest",
];

/// Resolve a raw class label to a species display name.
///
/// Scores each table entry by substring matches on the lowercased label:
/// scientific name +5, each common name +3, each keyword +1. The entry with
/// the highest score wins; a best score of 0 yields the unknown sentinel.
/// Deterministic: ties go to the earlier table entry.
pub fn resolve_species(label: &str) -> &'static str {
    let normalized = label.to_lowercase();

    let mut best: Option<(&'static str, u32)> = None;
    for entry in SPECIES_TABLE {
        let score = score_entry(entry, &normalized);
        let beats = best.is_none_or(|(_, s)| score > s);
        if beats {
            best = Some((entry.name, score));
        }
    }

    match best {
        Some((name, score)) if score > 0 => name,
        _ => UNKNOWN,
    }
}

fn score_entry(entry: &SpeciesEntry, normalized: &str) -> u32 {
    let mut score = 0;

    if normalized.contains(&entry.scientific_name.to_lowercase()) {
        score += SCIENTIFIC_NAME_SCORE;
    }
    for name in entry.common_names {
        if normalized.contains(&name.to_lowercase()) {
            score += COMMON_NAME_SCORE;
        }
    }
    for keyword in entry.keywords {
        if normalized.contains(&keyword.to_lowercase()) {
            score += KEYWORD_SCORE;
        }
    }

    score
}

/// Coarse check whether a free-text label refers to a bird at all.
///
/// Matches generic bird keywords plus every species' names and keywords.
/// Usable as a pre-filter before the confidence-weighted decode when the
/// model emits free-text labels instead of a fixed class index.
pub fn is_bird_label(label: &str) -> bool {
    let normalized = label.to_lowercase();

    if GENERAL_BIRD_KEYWORDS
        .iter()
        .any(|k| normalized.contains(&k.to_lowercase()))
    {
        return true;
    }

    SPECIES_TABLE.iter().any(|entry| {
        normalized.contains(&entry.scientific_name.to_lowercase())
            || entry
                .common_names
                .iter()
                .any(|n| normalized.contains(&n.to_lowercase()))
            || entry
                .keywords
                .iter()
                .any(|k| normalized.contains(&k.to_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_thrush_label() {
        // Common name (+3) and keyword (+1) both hit the same entry.
        let name = resolve_species("rufous-bellied thrush seen near feeder");
        assert_eq!(name, "Sabiá-laranjeira");
    }

    #[test]
    fn test_resolves_scientific_name() {
        assert_eq!(resolve_species("Passer domesticus at the feeder"), "Pardal");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            resolve_species("GREAT KISKADEE"),
            resolve_species("great kiskadee")
        );
        assert_eq!(resolve_species("GREAT KISKADEE"), "Bem-te-vi");
    }

    #[test]
    fn test_no_match_yields_sentinel() {
        assert_eq!(resolve_species("a red bicycle"), UNKNOWN);
        assert_eq!(resolve_species(""), UNKNOWN);
    }

    #[test]
    fn test_deterministic() {
        let label = "small dove on the wire";
        assert_eq!(resolve_species(label), resolve_species(label));
    }

    #[test]
    fn test_tie_broken_by_table_order() {
        // "dove" is a keyword of both Rolinha and Pomba; Rolinha comes first.
        assert_eq!(resolve_species("dove"), "Rolinha");
    }

    #[test]
    fn test_shared_keyword_prefers_stronger_match() {
        // Common name plus keyword outscores the bare "mimus" keyword hit.
        assert_eq!(
            resolve_species("chalk-browed mockingbird in the yard"),
            "Sabiá-do-campo"
        );
    }

    #[test]
    fn test_is_bird_label_generic_keywords() {
        assert!(is_bird_label("some bird on a branch"));
        assert!(is_bird_label("Pássaro pequeno"));
        assert!(is_bird_label("wing and beak visible"));
    }

    #[test]
    fn test_is_bird_label_species_terms() {
        assert!(is_bird_label("turdus rufiventris"));
        assert!(is_bird_label("woodpecker"));
    }

    #[test]
    fn test_is_bird_label_rejects_non_birds() {
        assert!(!is_bird_label("tabby cat"));
        assert!(!is_bird_label("parking meter"));
        assert!(!is_bird_label(""));
    }
}
