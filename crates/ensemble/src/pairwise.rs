//! Pairwise member differences.

use tracing::info;
use wx_common::{Field, Variable, VariableMeta, WxError, WxResult};

use crate::spread::finite_mean;

/// Labels for each member: the given ones, or `Model_0`, `Model_1`, ...
pub fn resolve_labels(n_fields: usize, labels: Option<&[String]>) -> WxResult<Vec<String>> {
    match labels {
        Some(labels) if labels.len() != n_fields => Err(WxError::LabelMismatch {
            labels: labels.len(),
            fields: n_fields,
        }),
        Some(labels) => Ok(labels.to_vec()),
        None => Ok((0..n_fields).map(|i| format!("Model_{}", i)).collect()),
    }
}

/// `fields[i][variable] - fields[j][variable]` for every pair `i < j`.
///
/// Entries come back in pair order, keyed `"{label_i}_minus_{label_j}"`.
pub fn pairwise_differences(
    fields: &[Field],
    variable: &str,
    labels: Option<&[String]>,
) -> WxResult<Vec<(String, Variable)>> {
    let labels = resolve_labels(fields.len(), labels)?;

    let vars = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            f.variable(variable)
                .ok_or_else(|| WxError::variable_not_found(variable, labels[i].as_str()))
        })
        .collect::<WxResult<Vec<_>>>()?;

    let mut differences = Vec::with_capacity(fields.len() * fields.len().saturating_sub(1) / 2);
    for i in 0..vars.len() {
        for j in (i + 1)..vars.len() {
            let key = format!("{}_minus_{}", labels[i], labels[j]);
            let diff = difference(&key, vars[i], vars[j])?;

            let values = diff.values();
            let max_abs = values
                .iter()
                .filter(|v| !v.is_nan())
                .fold(f32::NAN, |acc, v| acc.max(v.abs()));
            info!(
                pair = %key,
                mean_diff = finite_mean(values),
                max_abs_diff = max_abs,
                "Pairwise difference"
            );

            differences.push((key, diff));
        }
    }

    Ok(differences)
}

fn difference(key: &str, a: &Variable, b: &Variable) -> WxResult<Variable> {
    if a.shape() != b.shape() {
        return Err(WxError::GridMismatch(format!(
            "{}: shapes {:?} and {:?} differ",
            key,
            a.shape(),
            b.shape()
        )));
    }

    let values = a
        .values()
        .iter()
        .zip(b.values())
        .map(|(x, y)| x - y)
        .collect();
    let meta = VariableMeta::new(
        key,
        a.units(),
        format!("difference of {}", a.long_name()),
    );
    Variable::new(meta, a.dims().to_vec(), a.shape().to_vec(), values)
}
