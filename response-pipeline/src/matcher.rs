use crate::catalog::{self, ServiceEntry, CATALOG};

const KEYWORD_SCORE: usize = 10;
const NAME_SCORE: usize = 15;

/// Curated aliases checked before any scoring happens. Deliberately
/// partial: only the phrasings users actually type cold; everything else
/// falls through to the scoring pass.
const EXACT_KEYWORD_MAP: &[(&str, &[&str])] = &[
    ("web hosting", &["web-hosting"]),
    ("hosting", &["web-hosting"]),
    ("host my", &["web-hosting"]),
    ("vps", &["web-hosting"]),
    ("domain", &["domain-registration"]),
    ("dns", &["domain-registration"]),
    ("business email", &["email-hosting"]),
    ("mailbox", &["email-hosting"]),
    ("seo", &["seo-optimization"]),
    ("search engine", &["seo-optimization"]),
    ("ssl", &["ssl-certificates"]),
    ("https", &["ssl-certificates"]),
    ("certificate", &["ssl-certificates"]),
];

/// Two-phase relevance match. Phase one returns the curated alias hits
/// as-is; only alias-free text reaches the scoring pass (+10 per catalog
/// keyword hit, +15 for a full service-name hit, catalog order breaks
/// ties, zero scores are dropped).
pub fn relevant_services(text: &str) -> Vec<&'static ServiceEntry> {
    let lowered = text.to_lowercase();

    let mut ids: Vec<&str> = Vec::new();
    for (keyword, services) in EXACT_KEYWORD_MAP {
        if lowered.contains(keyword) {
            for id in *services {
                if !ids.contains(id) {
                    ids.push(id);
                }
            }
        }
    }
    if !ids.is_empty() {
        return ids.iter().filter_map(|id| catalog::find(id)).collect();
    }

    let mut scored: Vec<(usize, usize, &'static ServiceEntry)> = CATALOG
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let score = score_entry(entry, &lowered);
            (score > 0).then_some((score, position, entry))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    scored.into_iter().map(|(_, _, entry)| entry).collect()
}

fn score_entry(entry: &ServiceEntry, lowered_text: &str) -> usize {
    let mut score = 0usize;

    for keyword in entry.keywords {
        if lowered_text.contains(keyword) {
            score = score.saturating_add(KEYWORD_SCORE);
        }
    }

    if lowered_text.contains(&entry.name.to_lowercase()) {
        score = score.saturating_add(NAME_SCORE);
    }

    score
}
