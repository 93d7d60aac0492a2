use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::Serialize;
use tabled::Tabled;

use crate::error::RunDiagnostics;
use crate::settings::MetricTargets;
use crate::util;

/// Raw input table as loaded: trimmed header names plus untyped rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// One input row after field resolution: typed timestamps and durations,
/// `None` wherever the source cell was empty or unusable.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// 1-based position in the input file, kept for diagnostics.
    pub row: usize,
    pub equipe: String,
    pub data: Option<NaiveDate>,
    pub despachada: Option<NaiveDateTime>,
    pub a_caminho: Option<NaiveDateTime>,
    pub no_local: Option<NaiveDateTime>,
    pub liberada: Option<NaiveDateTime>,
    /// Release time of the team's previous order. Taken from the export
    /// when it carries the column, otherwise chained from the preceding
    /// order in the same journey.
    pub prev_liberada: Option<NaiveDateTime>,
    pub inicio_intervalo: Option<NaiveDateTime>,
    pub fim_intervalo: Option<NaiveDateTime>,
    pub inicio_calendario: Option<NaiveDateTime>,
    pub fim_calendario: Option<NaiveDateTime>,
    pub primeiro_login: Option<NaiveDateTime>,
    pub retorno_base: Option<i64>,
    pub horas_extras: Option<i64>,
}

impl OrderRecord {
    /// Preparation starts at the previous release when known, otherwise at
    /// dispatch.
    pub fn prep_start(&self) -> Option<NaiveDateTime> {
        self.prev_liberada.or(self.despachada)
    }
}

/// Per-order derived durations, whole minutes. `None` means the metric
/// could not be computed for this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderMetrics {
    pub temp_prep_equipe: Option<i64>,
    pub temp_exe: Option<i64>,
    pub temp_desl: Option<i64>,
    pub inter_reg: Option<i64>,
    pub atras_login: Option<i64>,
}

/// Shift-window identity: one team between one calendar start/end pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JourneyKey {
    pub equipe: String,
    pub inicio_calendario: Option<NaiveDateTime>,
    pub fim_calendario: Option<NaiveDateTime>,
}

/// Per-journey derived values. `retorno_base` and `horas_extras` are
/// recorded once per shift and carried forward from the first order that
/// has them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JourneyMetrics {
    pub jornada: Option<i64>,
    pub temp_sem_ordem: Option<i64>,
    pub retorno_base: Option<i64>,
    pub horas_extras: Option<i64>,
}

/// One fully-derived order row, ready for the calculated-data CSV.
///
/// Column names are a stability contract; downstream report generation
/// binds to them.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRow {
    #[serde(rename = "Equipe")]
    pub equipe: String,
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "Despachada")]
    pub despachada: String,
    #[serde(rename = "A_Caminho")]
    pub a_caminho: String,
    #[serde(rename = "No_Local")]
    pub no_local: String,
    #[serde(rename = "Liberada")]
    pub liberada: String,
    #[serde(rename = "TempPrepEquipe_min")]
    pub temp_prep_equipe: Option<i64>,
    #[serde(rename = "TempExe_min")]
    pub temp_exe: Option<i64>,
    #[serde(rename = "TempDesl_min")]
    pub temp_desl: Option<i64>,
    #[serde(rename = "InterReg_min")]
    pub inter_reg: Option<i64>,
    #[serde(rename = "AtrasLogin_min")]
    pub atras_login: Option<i64>,
    #[serde(rename = "Jornada_min")]
    pub jornada: Option<i64>,
    #[serde(rename = "TempSemOrdem_min")]
    pub temp_sem_ordem: Option<i64>,
    #[serde(rename = "Retorno_a_base_min")]
    pub retorno_base: Option<i64>,
    #[serde(rename = "Horas_Extras_min")]
    pub horas_extras: Option<i64>,
}

/// Aggregated values for one (team, day) group before rendering.
///
/// Metric slots hold `None` when the group had no contributing rows, so
/// "no data" never collapses into a zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSummary {
    pub equipe: String,
    /// `dd/mm/yyyy`, or `GERAL` for the per-team cross-day row.
    pub data: String,
    pub media_temp_prep_equipe: Option<f64>,
    pub media_temp_exe: Option<f64>,
    pub media_temp_desl: Option<f64>,
    pub media_inter_reg: Option<f64>,
    pub media_atras_login: Option<f64>,
    pub media_temp_sem_ordem: Option<f64>,
    pub retorno_a_base: Option<f64>,
    pub qtd_ordem: usize,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ProductiveRow {
    #[serde(rename = "Equipe")]
    #[tabled(rename = "Equipe")]
    pub equipe: String,
    #[serde(rename = "Data")]
    #[tabled(rename = "Data")]
    pub data: String,
    #[serde(rename = "Media_TempPrepEquipe")]
    #[tabled(rename = "Media_TempPrepEquipe")]
    pub media_temp_prep_equipe: String,
    #[serde(rename = "Media_TempExe")]
    #[tabled(rename = "Media_TempExe")]
    pub media_temp_exe: String,
    #[serde(rename = "Media_TempDesl")]
    #[tabled(rename = "Media_TempDesl")]
    pub media_temp_desl: String,
    #[serde(rename = "Retorno_a_base")]
    #[tabled(rename = "Retorno_a_base")]
    pub retorno_a_base: String,
    #[serde(rename = "qtd_ordem")]
    #[tabled(rename = "qtd_ordem")]
    pub qtd_ordem: usize,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ImprodutivasRow {
    #[serde(rename = "Equipe")]
    #[tabled(rename = "Equipe")]
    pub equipe: String,
    #[serde(rename = "Data")]
    #[tabled(rename = "Data")]
    pub data: String,
    #[serde(rename = "Media_InterReg")]
    #[tabled(rename = "Media_InterReg")]
    pub media_inter_reg: String,
    #[serde(rename = "Media_AtrasLogin")]
    #[tabled(rename = "Media_AtrasLogin")]
    pub media_atras_login: String,
    #[serde(rename = "Media_TempSemOrdem")]
    #[tabled(rename = "Media_TempSemOrdem")]
    pub media_temp_sem_ordem: String,
    #[serde(rename = "Retorno_a_base")]
    #[tabled(rename = "Retorno_a_base")]
    pub retorno_a_base: String,
    #[serde(rename = "qtd_ordem")]
    #[tabled(rename = "qtd_ordem")]
    pub qtd_ordem: usize,
}

/// Goal values echoed into the run summary for report-side comparison.
#[derive(Debug, Clone, Serialize)]
pub struct GoalSummary {
    pub meta_temp_exe_produtiva_min: f64,
    pub meta_temp_exe_improdutiva_min: f64,
    pub intervalo_regulamentar_min: f64,
    pub jornada_padrao_min: f64,
    pub tempo_util_meta_min: f64,
}

impl From<&MetricTargets> for GoalSummary {
    fn from(targets: &MetricTargets) -> Self {
        Self {
            meta_temp_exe_produtiva_min: targets.temp_exe_productive,
            meta_temp_exe_improdutiva_min: targets.temp_exe_unproductive,
            intervalo_regulamentar_min: targets.intervalo_regulamentar,
            jornada_padrao_min: targets.jornada_total,
            tempo_util_meta_min: util::round2(targets.tempo_util_meta()),
        }
    }
}

/// Run statistics written as `resumo.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_records: usize,
    pub total_teams: usize,
    pub total_journeys: usize,
    pub productive_rows: usize,
    pub unproductive_rows: usize,
    pub goals: GoalSummary,
    pub diagnostics: RunDiagnostics,
}

/// Everything one run produces, computed fully in memory before any file
/// is written.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub enriched: Vec<EnrichedRow>,
    pub productive: Vec<ProductiveRow>,
    pub unproductive: Vec<ImprodutivasRow>,
    pub summary: RunSummary,
}
