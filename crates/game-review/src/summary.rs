//! Compact text digest of a reviewed game, for downstream text services.

use std::fmt::Write;

use chess_core::Side;

use crate::analyzer::GameEvaluation;

/// Render the digest. At most `max_errors` errors are itemized, worst first.
pub fn format_summary(evaluation: &GameEvaluation, max_errors: usize) -> String {
    let mut out = String::new();

    let meta = &evaluation.metadata;
    if meta.white.is_some() || meta.black.is_some() {
        let _ = write!(
            out,
            "{} vs {}",
            meta.white.as_deref().unwrap_or("?"),
            meta.black.as_deref().unwrap_or("?")
        );
        if let Some(result) = &meta.result {
            let _ = write!(out, " ({result})");
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Accuracy: White {:.1}%, Black {:.1}%",
        evaluation.accuracy.white, evaluation.accuracy.black
    );

    for side in [Side::White, Side::Black] {
        let counts = evaluation.counts.get(side);
        if counts.total() == 0 {
            let _ = writeln!(out, "{side}: N/A");
        } else {
            let _ = writeln!(
                out,
                "{side}: {} blunders, {} mistakes, {} inaccuracies",
                counts.blunder, counts.mistake, counts.inaccuracy
            );
        }
    }

    if evaluation.unscored_positions > 0 {
        let _ = writeln!(out, "Unscored positions: {}", evaluation.unscored_positions);
    }

    let mut errors: Vec<_> = evaluation
        .moves
        .iter()
        .filter_map(|m| m.classification.as_ref().map(|c| (m, c)))
        .filter(|(_, c)| c.class.is_error())
        .collect();
    errors.sort_by(|(_, a), (_, b)| {
        b.loss_magnitude
            .total_cmp(&a.loss_magnitude)
            .then(a.ply_index.cmp(&b.ply_index))
    });

    if !errors.is_empty() {
        out.push_str("Key errors:\n");
    }
    for (reviewed, c) in errors.into_iter().take(max_errors) {
        let _ = write!(
            out,
            "{} ({}) {}, {:.1}",
            reviewed.ply.numbered_notation(),
            c.moving_side,
            c.class,
            -c.display_loss()
        );
        if let Some(best) = evaluation
            .evaluation_before(c.ply_index)
            .and_then(|e| e.best_reply.as_deref())
        {
            let _ = write!(out, " (best {best})");
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}
