//! Picks the best search hit for a request.
//!
//! Both scraping sources filter the same way: hits whose normalized title
//! and artist match the request form an exact partition, and when that
//! partition is non-empty only its members are considered. A field missing
//! from the request matches anything. The sources differ in the artist rule
//! and in how ties are broken afterwards, hence the two entry points.

use crate::lyrics::normalize::comparison_key;
use crate::lyrics::types::SearchHit;

/// Choose the hit with the largest numeric id among the exact matches (or
/// among all hits when nothing matches exactly). Listing ids grow over
/// time, so the largest id is the most recent entry. Ties keep the earliest
/// hit in result order.
pub fn choose_newest<'a>(
    hits: &'a [SearchHit],
    title: Option<&str>,
    artist: Option<&str>,
) -> Option<&'a SearchHit> {
    let pool = candidate_pool(hits, title, artist, false);
    let mut best: Option<(&SearchHit, u64)> = None;
    for hit in pool {
        let id = hit.external_id.parse::<u64>().unwrap_or(0);
        if best.is_none_or(|(_, top)| id > top) {
            best = Some((hit, id));
        }
    }
    best.map(|(hit, _)| hit)
}

/// Choose the hit whose normalized title and artist lengths sit closest to
/// the request, among the exact matches (or among all hits when nothing
/// matches exactly). Here the artist rule is containment rather than
/// equality, so "feat." credits appended to the site's artist field still
/// match. Ties keep the earliest hit in result order.
pub fn choose_closest_length<'a>(
    hits: &'a [SearchHit],
    title: Option<&str>,
    artist: Option<&str>,
) -> Option<&'a SearchHit> {
    let pool = candidate_pool(hits, title, artist, true);
    let want_title = comparison_key(title);
    let want_artist = comparison_key(artist);
    let mut best: Option<(&SearchHit, i64)> = None;
    for hit in pool {
        let score = length_score(&want_title, &comparison_key(Some(&hit.title)))
            + length_score(&want_artist, &comparison_key(hit.artist.as_deref()));
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((hit, score));
        }
    }
    best.map(|(hit, _)| hit)
}

fn candidate_pool<'a>(
    hits: &'a [SearchHit],
    title: Option<&str>,
    artist: Option<&str>,
    artist_contains: bool,
) -> Vec<&'a SearchHit> {
    let want_title = comparison_key(title);
    let want_artist = comparison_key(artist);
    let exact: Vec<&SearchHit> = hits
        .iter()
        .filter(|hit| {
            let title_ok = want_title.is_empty() || comparison_key(Some(&hit.title)) == want_title;
            let artist_ok = want_artist.is_empty() || {
                let key = comparison_key(hit.artist.as_deref());
                if artist_contains {
                    key.contains(&want_artist)
                } else {
                    key == want_artist
                }
            };
            title_ok && artist_ok
        })
        .collect();
    if exact.is_empty() {
        hits.iter().collect()
    } else {
        exact
    }
}

/// Per-field closeness: 2 * (100 - |length difference|), in characters of
/// the normalized keys. Goes negative for wildly different lengths.
fn length_score(requested: &str, candidate: &str) -> i64 {
    let diff = requested.chars().count().abs_diff(candidate.chars().count());
    2 * (100 - diff as i64)
}
