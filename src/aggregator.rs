// (team, day) aggregation.
//
// Each summary column folds by its own policy; the full rule set lives in
// POLICIES so the one asymmetric rule stays visible in a single place:
// TempSemOrdem is summed across a day's journeys, and only the per-team
// rollup row averages those daily sums.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::RunDiagnostics;
use crate::types::{
    GroupSummary, ImprodutivasRow, JourneyMetrics, OrderMetrics, OrderRecord, ProductiveRow,
};
use crate::util;

/// How one summary column folds over its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggPolicy {
    /// Mean of per-order values, nulls ignored; null when all are null.
    /// Rollup row: mean of the daily means.
    MeanOfOrders,
    /// Sum of per-journey values within the day, not a mean. Rollup row:
    /// mean of the daily sums.
    SumPerJourney,
    /// First non-null value in input row order. Rollup row: mean of the
    /// daily values.
    FirstNonNull,
    /// Count of order rows; zero is a valid value, never null. Rollup
    /// row: sum of the daily counts.
    CountRows,
}

/// Declarative policy table, one entry per summary column.
pub static POLICIES: Lazy<Vec<(&'static str, AggPolicy)>> = Lazy::new(|| {
    vec![
        ("Media_TempPrepEquipe", AggPolicy::MeanOfOrders),
        ("Media_TempExe", AggPolicy::MeanOfOrders),
        ("Media_TempDesl", AggPolicy::MeanOfOrders),
        ("Media_InterReg", AggPolicy::MeanOfOrders),
        ("Media_AtrasLogin", AggPolicy::MeanOfOrders),
        ("Media_TempSemOrdem", AggPolicy::SumPerJourney),
        ("Retorno_a_base", AggPolicy::FirstNonNull),
        ("qtd_ordem", AggPolicy::CountRows),
    ]
});

pub fn policy_for(column: &str) -> Option<AggPolicy> {
    POLICIES
        .iter()
        .find(|(name, _)| *name == column)
        .map(|&(_, p)| p)
}

/// Fold one day-level column by looking its policy up in the table. An
/// unknown column folds to null.
fn fold_col(column: &'static str, values: &[f64], diag: &mut RunDiagnostics) -> Option<f64> {
    match policy_for(column) {
        Some(policy) => fold_day(policy, values, diag),
        None => None,
    }
}

/// Rollup-row counterpart of [`fold_col`].
fn fold_rollup_col(column: &'static str, daily: &[f64]) -> Option<f64> {
    policy_for(column).and_then(|policy| fold_rollup(policy, daily))
}

/// Raw values collected for one (team, day) group, shaped the way each
/// policy folds them.
#[derive(Debug, Default)]
struct DayAcc {
    temp_prep_equipe: Vec<f64>,
    temp_exe: Vec<f64>,
    temp_desl: Vec<f64>,
    inter_reg: Vec<f64>,
    atras_login: Vec<f64>,
    /// One entry per journey that day, in journey-appearance order.
    sem_ordem_per_journey: Vec<f64>,
    /// Per-order values in input row order; the fold takes the first.
    retorno_in_row_order: Vec<f64>,
    qtd_ordem: usize,
}

/// Fold one day-level metric. `values` are the group's non-null entries in
/// the order the policy cares about.
fn fold_day(policy: AggPolicy, values: &[f64], diag: &mut RunDiagnostics) -> Option<f64> {
    let folded = match policy {
        AggPolicy::MeanOfOrders => util::mean(values).map(util::round2),
        AggPolicy::SumPerJourney => {
            if values.is_empty() {
                None
            } else {
                Some(util::round2(values.iter().sum()))
            }
        }
        AggPolicy::FirstNonNull => values.first().copied(),
        AggPolicy::CountRows => Some(values.len() as f64),
    };
    if folded.is_none() {
        diag.empty_group += 1;
    }
    folded
}

/// Fold the per-team rollup row from the daily values.
fn fold_rollup(policy: AggPolicy, daily: &[f64]) -> Option<f64> {
    match policy {
        AggPolicy::CountRows => Some(daily.iter().sum()),
        // Everything else, including the daily TempSemOrdem sums, averages
        // across days.
        _ => util::mean(daily).map(util::round2),
    }
}

fn fmt_day(day: &Option<NaiveDate>) -> String {
    day.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn push_opt(bag: &mut Vec<f64>, v: Option<i64>) {
    if let Some(v) = v {
        bag.push(v as f64);
    }
}

/// Group the enriched data by (team, day), fold every metric per its
/// policy, and append one cross-day rollup row per team.
///
/// Output order is deterministic: teams sorted, then days sorted (dayless
/// rows first), rollup row last per team.
pub fn aggregate(
    records: &[OrderRecord],
    metrics: &[OrderMetrics],
    journeys: &[Vec<usize>],
    journey_metrics: &[JourneyMetrics],
    diag: &mut RunDiagnostics,
) -> Vec<GroupSummary> {
    let mut teams: BTreeMap<String, BTreeMap<Option<NaiveDate>, DayAcc>> = BTreeMap::new();

    // Per-order values, visited in input row order.
    for (rec, m) in records.iter().zip(metrics) {
        let acc = teams
            .entry(rec.equipe.clone())
            .or_default()
            .entry(rec.data)
            .or_default();
        acc.qtd_ordem += 1;
        push_opt(&mut acc.temp_prep_equipe, m.temp_prep_equipe);
        push_opt(&mut acc.temp_exe, m.temp_exe);
        push_opt(&mut acc.temp_desl, m.temp_desl);
        push_opt(&mut acc.inter_reg, m.inter_reg);
        push_opt(&mut acc.atras_login, m.atras_login);
        push_opt(&mut acc.retorno_in_row_order, rec.retorno_base);
    }

    // Per-journey values land on the day of the journey's first order.
    for (bucket, jm) in journeys.iter().zip(journey_metrics) {
        let Some(&first) = bucket.first() else {
            continue;
        };
        let rec = &records[first];
        let acc = teams
            .entry(rec.equipe.clone())
            .or_default()
            .entry(rec.data)
            .or_default();
        push_opt(&mut acc.sem_ordem_per_journey, jm.temp_sem_ordem);
    }

    let mut rows: Vec<GroupSummary> = Vec::new();
    for (equipe, days) in &teams {
        let team_start = rows.len();
        for (day, acc) in days {
            rows.push(GroupSummary {
                equipe: equipe.clone(),
                data: fmt_day(day),
                media_temp_prep_equipe: fold_col("Media_TempPrepEquipe", &acc.temp_prep_equipe, diag),
                media_temp_exe: fold_col("Media_TempExe", &acc.temp_exe, diag),
                media_temp_desl: fold_col("Media_TempDesl", &acc.temp_desl, diag),
                media_inter_reg: fold_col("Media_InterReg", &acc.inter_reg, diag),
                media_atras_login: fold_col("Media_AtrasLogin", &acc.atras_login, diag),
                media_temp_sem_ordem: fold_col(
                    "Media_TempSemOrdem",
                    &acc.sem_ordem_per_journey,
                    diag,
                ),
                retorno_a_base: fold_col("Retorno_a_base", &acc.retorno_in_row_order, diag),
                qtd_ordem: acc.qtd_ordem,
            });
        }
        let rollup = rollup_row(equipe, &rows[team_start..]);
        rows.push(rollup);
    }

    info!(
        teams = teams.len(),
        summary_rows = rows.len(),
        "aggregation finished"
    );
    rows
}

/// The `MédiaTodosDias` row: one team's daily rows folded across days.
fn rollup_row(equipe: &str, daily: &[GroupSummary]) -> GroupSummary {
    fn collected(daily: &[GroupSummary], get: impl Fn(&GroupSummary) -> Option<f64>) -> Vec<f64> {
        daily.iter().filter_map(get).collect()
    }

    let counts: Vec<f64> = daily.iter().map(|r| r.qtd_ordem as f64).collect();
    GroupSummary {
        equipe: format!("MédiaTodosDias{equipe}"),
        data: "GERAL".to_string(),
        media_temp_prep_equipe: fold_rollup_col(
            "Media_TempPrepEquipe",
            &collected(daily, |r| r.media_temp_prep_equipe),
        ),
        media_temp_exe: fold_rollup_col("Media_TempExe", &collected(daily, |r| r.media_temp_exe)),
        media_temp_desl: fold_rollup_col(
            "Media_TempDesl",
            &collected(daily, |r| r.media_temp_desl),
        ),
        media_inter_reg: fold_rollup_col(
            "Media_InterReg",
            &collected(daily, |r| r.media_inter_reg),
        ),
        media_atras_login: fold_rollup_col(
            "Media_AtrasLogin",
            &collected(daily, |r| r.media_atras_login),
        ),
        media_temp_sem_ordem: fold_rollup_col(
            "Media_TempSemOrdem",
            &collected(daily, |r| r.media_temp_sem_ordem),
        ),
        retorno_a_base: fold_rollup_col("Retorno_a_base", &collected(daily, |r| r.retorno_a_base)),
        qtd_ordem: fold_rollup_col("qtd_ordem", &counts)
            .map(|v| v as usize)
            .unwrap_or_default(),
    }
}

/// Execution-oriented summary table.
pub fn render_productive(groups: &[GroupSummary]) -> Vec<ProductiveRow> {
    groups
        .iter()
        .map(|g| ProductiveRow {
            equipe: g.equipe.clone(),
            data: g.data.clone(),
            media_temp_prep_equipe: util::fmt_opt(g.media_temp_prep_equipe),
            media_temp_exe: util::fmt_opt(g.media_temp_exe),
            media_temp_desl: util::fmt_opt(g.media_temp_desl),
            retorno_a_base: util::fmt_opt(g.retorno_a_base),
            qtd_ordem: g.qtd_ordem,
        })
        .collect()
}

/// Break/delay/idle-oriented ("Improdutivas") summary table.
pub fn render_improdutivas(groups: &[GroupSummary]) -> Vec<ImprodutivasRow> {
    groups
        .iter()
        .map(|g| ImprodutivasRow {
            equipe: g.equipe.clone(),
            data: g.data.clone(),
            media_inter_reg: util::fmt_opt(g.media_inter_reg),
            media_atras_login: util::fmt_opt(g.media_atras_login),
            media_temp_sem_ordem: util::fmt_opt(g.media_temp_sem_ordem),
            retorno_a_base: util::fmt_opt(g.retorno_a_base),
            qtd_ordem: g.qtd_ordem,
        })
        .collect()
}
