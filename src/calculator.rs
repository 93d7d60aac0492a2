// Per-order duration metrics.
//
// Every metric shares one rule: both timestamps must be present and in
// clock order, otherwise the metric is null and the finding is tallied.
use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::RunDiagnostics;
use crate::types::{OrderMetrics, OrderRecord};
use crate::util;

/// Whole minutes between `later` and `earlier` under the shared null rule.
///
/// Out-of-order stamps are invalid data, not a zero-length interval, so a
/// negative difference is dropped rather than clamped.
pub fn minutes_between(
    later: Option<NaiveDateTime>,
    earlier: Option<NaiveDateTime>,
    diag: &mut RunDiagnostics,
) -> Option<i64> {
    let (later, earlier) = match (later, earlier) {
        (Some(l), Some(e)) => (l, e),
        _ => {
            diag.missing_field += 1;
            return None;
        }
    };
    let minutes = util::diff_minutes(later, earlier);
    if minutes < 0 {
        diag.negative_duration += 1;
        warn!(minutes, %later, %earlier, "out-of-order timestamps, dropping metric");
        return None;
    }
    Some(minutes)
}

/// Compute every per-order metric for one record.
pub fn order_metrics(rec: &OrderRecord, diag: &mut RunDiagnostics) -> OrderMetrics {
    OrderMetrics {
        temp_prep_equipe: minutes_between(rec.a_caminho, rec.prep_start(), diag),
        temp_exe: minutes_between(rec.liberada, rec.no_local, diag),
        temp_desl: minutes_between(rec.no_local, rec.a_caminho, diag),
        inter_reg: minutes_between(rec.fim_intervalo, rec.inicio_intervalo, diag),
        atras_login: minutes_between(rec.primeiro_login, rec.inicio_calendario, diag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_datetime;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> Option<NaiveDateTime> {
        Some(parse_datetime(s).unwrap())
    }

    fn record() -> OrderRecord {
        OrderRecord {
            row: 1,
            equipe: "T01".to_string(),
            data: None,
            despachada: dt("01/03/2024 08:10"),
            a_caminho: dt("01/03/2024 08:15"),
            no_local: dt("01/03/2024 08:25"),
            liberada: dt("01/03/2024 09:05"),
            prev_liberada: None,
            inicio_intervalo: dt("01/03/2024 12:00"),
            fim_intervalo: dt("01/03/2024 12:30"),
            inicio_calendario: dt("01/03/2024 08:00"),
            fim_calendario: dt("01/03/2024 16:00"),
            primeiro_login: dt("01/03/2024 08:05"),
            retorno_base: None,
            horas_extras: None,
        }
    }

    #[test]
    fn computes_all_metrics_when_stamps_are_ordered() {
        let mut diag = RunDiagnostics::default();
        let m = order_metrics(&record(), &mut diag);
        assert_eq!(m.temp_prep_equipe, Some(5)); // A_Caminho - Despachada
        assert_eq!(m.temp_exe, Some(40)); // Liberada - No_Local
        assert_eq!(m.temp_desl, Some(10)); // No_Local - A_Caminho
        assert_eq!(m.inter_reg, Some(30));
        assert_eq!(m.atras_login, Some(5));
        assert_eq!(diag.total(), 0);
    }

    #[test]
    fn previous_release_wins_over_dispatch_for_preparation() {
        let mut rec = record();
        rec.prev_liberada = dt("01/03/2024 08:00");
        let mut diag = RunDiagnostics::default();
        let m = order_metrics(&rec, &mut diag);
        assert_eq!(m.temp_prep_equipe, Some(15)); // A_Caminho - PrevLiberada
    }

    #[test]
    fn missing_side_nulls_the_metric_and_counts() {
        let mut rec = record();
        rec.no_local = None;
        let mut diag = RunDiagnostics::default();
        let m = order_metrics(&rec, &mut diag);
        assert_eq!(m.temp_exe, None);
        assert_eq!(m.temp_desl, None);
        assert_eq!(diag.missing_field, 2);
    }

    #[test]
    fn negative_difference_is_null_never_negative() {
        let mut rec = record();
        rec.liberada = dt("01/03/2024 08:20"); // before No_Local
        let mut diag = RunDiagnostics::default();
        let m = order_metrics(&rec, &mut diag);
        assert_eq!(m.temp_exe, None);
        assert_eq!(diag.negative_duration, 1);
    }

    #[test]
    fn no_break_recorded_counts_as_missing() {
        let mut rec = record();
        rec.inicio_intervalo = None;
        rec.fim_intervalo = None;
        let mut diag = RunDiagnostics::default();
        let m = order_metrics(&rec, &mut diag);
        assert_eq!(m.inter_reg, None);
        assert_eq!(diag.missing_field, 1);
    }
}
