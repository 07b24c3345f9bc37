use std::cmp::Reverse;

/// Sort key for a matched section: higher score first, then earlier section
pub type RankKey = (f32, Reverse<usize>);

/// Relevance of a section: summed term frequency plus a bonus for heading hits
pub fn score(total_frequency: u32, heading_hit: bool, heading_bonus: f32) -> f32 {
    let bonus = if heading_hit { heading_bonus } else { 0.0 };
    total_frequency as f32 + bonus
}

pub fn rank_key(score: f32, ordinal: usize) -> RankKey {
    (score, Reverse(ordinal))
}

/// Get N highest results from an unranked list
pub fn top_n<T: PartialOrd + Clone>(rank_list: &[T], n: usize) -> Vec<T> {
    let mut top_n_list = rank_list.to_vec();
    // Stable sort keeps equal keys in input order
    top_n_list.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    top_n_list.truncate(n);
    top_n_list
}
