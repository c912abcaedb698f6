use std::cmp::Ordering;

use super::types::{Candidate, CandidateOptions, CandidateScores, ScoredLeaf};

/// Min-max bounds of one score dimension over a pool.
#[derive(Debug, Clone, Copy)]
struct Range {
    min: f32,
    max: f32,
}

impl Range {
    fn of(values: impl Iterator<Item = f32>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Range { min: v, max: v }),
            Some(r) => Some(Range {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    /// `0.0` when the pool is constant in this dimension.
    fn normalize(&self, v: f32) -> f32 {
        let span = self.max - self.min;
        if span <= f32::EPSILON {
            return 0.0;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Normalizes each dimension across `pool`, fuses, and keeps the best `top_k`.
///
/// Min/max are taken over this pool only. Ties keep pool order.
pub fn fuse(pool: &[ScoredLeaf<'_>], options: &CandidateOptions) -> Vec<Candidate> {
    let (Some(lexical), Some(cosine)) = (
        Range::of(pool.iter().map(|s| s.lexical)),
        Range::of(pool.iter().map(|s| s.cosine)),
    ) else {
        return Vec::new();
    };

    let mut candidates: Vec<Candidate> = pool
        .iter()
        .map(|s| {
            let lexical = lexical.normalize(s.lexical);
            let cosine = cosine.normalize(s.cosine);
            let fused = options.embedding_weight * cosine + options.lexical_weight * lexical;
            Candidate::from_leaf(
                s.leaf,
                CandidateScores {
                    lexical,
                    cosine,
                    fused,
                },
            )
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.scores
            .fused
            .partial_cmp(&a.scores.fused)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(options.top_k);
    candidates
}
