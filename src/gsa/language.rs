//! `Accept-Language` negotiation.

/// Languages named by an `Accept-Language` header, best first
///
/// Only the primary subtag is kept (`en-US` becomes `en`), lowercased and
/// de-duplicated. The wildcard and entries with `q=0` are dropped; malformed
/// quality values count as `q=1`.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut ranked: Vec<(f32, String)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if quality <= 0.0 {
                return None;
            }

            let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
            (!primary.is_empty()).then_some((quality, primary))
        })
        .collect();

    // stable: equal weights keep header order
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut languages: Vec<String> = Vec::with_capacity(ranked.len());
    for (_, lang) in ranked {
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    }
    languages
}
