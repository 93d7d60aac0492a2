// End-to-end assembly: raw table in, three tables out.
//
// Everything is computed in memory before the caller writes a single file,
// so a failed run leaves no partial output behind.
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use tracing::info;

use crate::aggregator;
use crate::calculator;
use crate::error::{Result, RunDiagnostics};
use crate::journey;
use crate::resolver::ColumnMap;
use crate::settings::Settings;
use crate::types::{
    EnrichedRow, GoalSummary, JourneyMetrics, OrderMetrics, OrderRecord, ProcessingResult,
    RawTable, RunSummary,
};

fn fmt_stamp(dt: Option<NaiveDateTime>) -> String {
    dt.map(|d| d.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn enriched_row(rec: &OrderRecord, m: &OrderMetrics, jm: &JourneyMetrics) -> EnrichedRow {
    EnrichedRow {
        equipe: rec.equipe.clone(),
        data: rec
            .data
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
        despachada: fmt_stamp(rec.despachada),
        a_caminho: fmt_stamp(rec.a_caminho),
        no_local: fmt_stamp(rec.no_local),
        liberada: fmt_stamp(rec.liberada),
        temp_prep_equipe: m.temp_prep_equipe,
        temp_exe: m.temp_exe,
        temp_desl: m.temp_desl,
        inter_reg: m.inter_reg,
        atras_login: m.atras_login,
        jornada: jm.jornada,
        temp_sem_ordem: jm.temp_sem_ordem,
        retorno_base: jm.retorno_base,
        horas_extras: jm.horas_extras,
    }
}

/// Run the full calculation and aggregation pass over one loaded table.
///
/// Fails fast when a required column is missing from the header row; every
/// row-level problem degrades to null and lands in the diagnostics.
pub fn run(table: &RawTable, settings: &Settings) -> Result<ProcessingResult> {
    let mut diag = RunDiagnostics::default();
    info!(rows = table.rows.len(), "starting run");

    let columns = ColumnMap::resolve(&table.headers, &settings.columns)?;

    let mut records: Vec<OrderRecord> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| columns.resolve_record(row, i + 1, &mut diag))
        .collect();

    let journeys = journey::group_journeys(&records);
    journey::chain_prev_liberada(&mut records, &journeys);

    let metrics: Vec<OrderMetrics> = records
        .iter()
        .map(|r| calculator::order_metrics(r, &mut diag))
        .collect();

    let journey_values: Vec<JourneyMetrics> = journeys
        .iter()
        .map(|bucket| journey::journey_metrics(&records, &metrics, bucket, &mut diag))
        .collect();
    info!(journeys = journeys.len(), "journey metrics computed");

    // Spread each journey's values back onto its order rows for the
    // calculated-data table.
    let mut per_row = vec![JourneyMetrics::default(); records.len()];
    for (bucket, jm) in journeys.iter().zip(&journey_values) {
        for &i in bucket {
            per_row[i] = *jm;
        }
    }

    let enriched: Vec<EnrichedRow> = records
        .iter()
        .zip(&metrics)
        .zip(&per_row)
        .map(|((rec, m), jm)| enriched_row(rec, m, jm))
        .collect();

    let groups = aggregator::aggregate(&records, &metrics, &journeys, &journey_values, &mut diag);
    let productive = aggregator::render_productive(&groups);
    let unproductive = aggregator::render_improdutivas(&groups);

    diag.log();

    let total_teams = records
        .iter()
        .map(|r| r.equipe.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let summary = RunSummary {
        total_records: records.len(),
        total_teams,
        total_journeys: journeys.len(),
        productive_rows: productive.len(),
        unproductive_rows: unproductive.len(),
        goals: GoalSummary::from(&settings.metrics),
        diagnostics: diag,
    };

    Ok(ProcessingResult {
        enriched,
        productive,
        unproductive,
        summary,
    })
}
