//! Held-out evaluation: accuracy and support-weighted precision, recall, F1

use credit_core::EvaluationMetrics;

/// Evaluate predictions against true class codes
///
/// Classes with no predictions score a precision of 0, matching the usual
/// zero-division convention. Weights are the true-class supports.
pub fn evaluate(actual: &[usize], predicted: &[usize], n_classes: usize) -> EvaluationMetrics {
    let total = actual.len().min(predicted.len());
    if total == 0 {
        return EvaluationMetrics::default();
    }

    let mut true_pos = vec![0usize; n_classes];
    let mut pred_count = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];
    for (&a, &p) in actual.iter().zip(predicted) {
        support[a] += 1;
        pred_count[p] += 1;
        if a == p {
            true_pos[a] += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1_score = 0.0;
    for class in 0..n_classes {
        let weight = support[class] as f64 / total as f64;
        let p = ratio(true_pos[class], pred_count[class]);
        let r = ratio(true_pos[class], support[class]);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        precision += weight * p;
        recall += weight * r;
        f1_score += weight * f;
    }

    EvaluationMetrics {
        accuracy: ratio(true_pos.iter().sum(), total),
        precision,
        recall,
        f1_score,
    }
}
