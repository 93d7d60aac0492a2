// Journey grouping and shift-level metrics.
//
// A journey is one team's calendar window. Orders are chained inside it in
// A_Caminho order so each order can see the previous release time.
use std::collections::HashMap;

use tracing::debug;

use crate::calculator;
use crate::error::RunDiagnostics;
use crate::types::{JourneyKey, JourneyMetrics, OrderMetrics, OrderRecord};

/// Bucket the run's records into journeys.
///
/// Returns indices into `records`, buckets in first-appearance order and
/// orders inside a bucket sorted by `A_Caminho` (nulls last, input order
/// preserved among ties) so the chaining below is deterministic.
pub fn group_journeys(records: &[OrderRecord]) -> Vec<Vec<usize>> {
    let mut order: Vec<JourneyKey> = Vec::new();
    let mut buckets: HashMap<JourneyKey, Vec<usize>> = HashMap::new();

    for (i, rec) in records.iter().enumerate() {
        let key = JourneyKey {
            equipe: rec.equipe.clone(),
            inicio_calendario: rec.inicio_calendario,
            fim_calendario: rec.fim_calendario,
        };
        buckets
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(i);
    }

    let mut grouped: Vec<Vec<usize>> = order
        .iter()
        .map(|k| buckets.remove(k).unwrap_or_default())
        .collect();
    for bucket in &mut grouped {
        bucket.sort_by_key(|&i| (records[i].a_caminho.is_none(), records[i].a_caminho, i));
    }
    debug!(journeys = grouped.len(), "journeys grouped");
    grouped
}

/// Fill each order's previous-release stamp from its predecessor in the
/// journey, unless the export already provided one.
pub fn chain_prev_liberada(records: &mut [OrderRecord], journeys: &[Vec<usize>]) {
    for bucket in journeys {
        for pair in bucket.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let prev_release = records[prev].liberada;
            if records[cur].prev_liberada.is_none() {
                records[cur].prev_liberada = prev_release;
            }
        }
    }
}

/// Shift-level metrics for one journey bucket.
///
/// `TempSemOrdem` degrades gracefully: a missing addend counts as zero, so
/// one broken order does not null the whole shift. Only a missing calendar
/// window nulls it.
pub fn journey_metrics(
    records: &[OrderRecord],
    metrics: &[OrderMetrics],
    bucket: &[usize],
    diag: &mut RunDiagnostics,
) -> JourneyMetrics {
    let first = match bucket.first() {
        Some(&i) => &records[i],
        None => return JourneyMetrics::default(),
    };

    let jornada = calculator::minutes_between(first.fim_calendario, first.inicio_calendario, diag);

    // Recorded once per shift, on whichever row carries them.
    let retorno_base = bucket.iter().find_map(|&i| records[i].retorno_base);
    let horas_extras = bucket.iter().find_map(|&i| records[i].horas_extras);
    let intervalo = bucket.iter().find_map(|&i| metrics[i].inter_reg);

    let temp_sem_ordem = jornada.map(|j| {
        let hd_total: i64 = bucket
            .iter()
            .map(|&i| metrics[i].temp_exe.unwrap_or(0) + metrics[i].temp_desl.unwrap_or(0))
            .sum();
        let prep_total: i64 = bucket
            .iter()
            .map(|&i| metrics[i].temp_prep_equipe.unwrap_or(0))
            .sum();
        j - hd_total - prep_total - intervalo.unwrap_or(0) - retorno_base.unwrap_or(0)
    });

    JourneyMetrics {
        jornada,
        temp_sem_ordem,
        retorno_base,
        horas_extras,
    }
}
