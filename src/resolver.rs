// Maps logical time fields onto whatever columns the export actually has.
//
// Column resolution runs once against the header row; after that every
// lookup is an index access. Field parsing is forgiving: an empty cell is
// "absent", a non-empty cell that fails to parse counts as unparseable and
// is treated as absent from there on.
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result, RunDiagnostics};
use crate::settings::ColumnSettings;
use crate::types::OrderRecord;
use crate::util;

/// Resolved column indices for one input table.
///
/// Required fields abort resolution when no candidate matches; optional
/// ones stay `None` and every cell read through them is absent.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    equipe: usize,
    data_referencia: Option<usize>,
    despachada: usize,
    a_caminho: usize,
    no_local: usize,
    liberada: usize,
    prev_liberada: Option<usize>,
    inicio_intervalo: Option<usize>,
    fim_intervalo: Option<usize>,
    inicio_calendario: usize,
    fim_calendario: usize,
    primeiro_login: Option<usize>,
    retorno_base: Option<usize>,
    horas_extras: Option<usize>,
}

fn find(headers: &[String], candidates: &[String]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| headers.iter().position(|h| h.trim() == c))
}

fn require(
    headers: &[String],
    logical: &'static str,
    candidates: &[String],
) -> Result<usize> {
    find(headers, candidates).ok_or_else(|| PipelineError::MissingColumn {
        logical,
        candidates: candidates.join(", "),
    })
}

impl ColumnMap {
    pub fn resolve(headers: &[String], cols: &ColumnSettings) -> Result<Self> {
        let map = Self {
            equipe: require(headers, "Equipe", &cols.equipe)?,
            data_referencia: find(headers, &cols.data_referencia),
            despachada: require(headers, "Despachada", &cols.despachada)?,
            a_caminho: require(headers, "A_Caminho", &cols.a_caminho)?,
            no_local: require(headers, "No_Local", &cols.no_local)?,
            liberada: require(headers, "Liberada", &cols.liberada)?,
            prev_liberada: find(headers, &cols.prev_liberada),
            inicio_intervalo: find(headers, &cols.inicio_intervalo),
            fim_intervalo: find(headers, &cols.fim_intervalo),
            inicio_calendario: require(headers, "Inicio Calendario", &cols.inicio_calendario)?,
            fim_calendario: require(headers, "Fim Calendario", &cols.fim_calendario)?,
            primeiro_login: find(headers, &cols.primeiro_login),
            retorno_base: find(headers, &cols.retorno_base),
            horas_extras: find(headers, &cols.horas_extras),
        };
        debug!(?map, "columns resolved");
        Ok(map)
    }

    /// Build one typed record from a raw CSV row.
    pub fn resolve_record(
        &self,
        row: &StringRecord,
        row_no: usize,
        diag: &mut RunDiagnostics,
    ) -> OrderRecord {
        let despachada = self.timestamp(row, Some(self.despachada), diag);
        // The reference-date column wins; otherwise the day the order was
        // dispatched.
        let data = self
            .date(row, self.data_referencia, diag)
            .or_else(|| despachada.map(|dt| dt.date()));

        OrderRecord {
            row: row_no,
            equipe: self
                .cell(row, Some(self.equipe))
                .unwrap_or_default()
                .to_string(),
            data,
            despachada,
            a_caminho: self.timestamp(row, Some(self.a_caminho), diag),
            no_local: self.timestamp(row, Some(self.no_local), diag),
            liberada: self.timestamp(row, Some(self.liberada), diag),
            prev_liberada: self.timestamp(row, self.prev_liberada, diag),
            inicio_intervalo: self.timestamp(row, self.inicio_intervalo, diag),
            fim_intervalo: self.timestamp(row, self.fim_intervalo, diag),
            inicio_calendario: self.timestamp(row, Some(self.inicio_calendario), diag),
            fim_calendario: self.timestamp(row, Some(self.fim_calendario), diag),
            primeiro_login: self.login(row, diag),
            retorno_base: self.minutes(row, self.retorno_base, diag),
            horas_extras: self.minutes(row, self.horas_extras, diag),
        }
    }

    fn cell<'a>(&self, row: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
        let v = row.get(idx?)?.trim();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    }

    fn timestamp(
        &self,
        row: &StringRecord,
        idx: Option<usize>,
        diag: &mut RunDiagnostics,
    ) -> Option<NaiveDateTime> {
        let raw = self.cell(row, idx)?;
        match util::parse_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                diag.unparseable_value += 1;
                warn!(value = raw, "unparseable timestamp, treating as absent");
                None
            }
        }
    }

    fn date(
        &self,
        row: &StringRecord,
        idx: Option<usize>,
        diag: &mut RunDiagnostics,
    ) -> Option<NaiveDate> {
        let raw = self.cell(row, idx)?;
        match util::parse_date(raw) {
            Some(d) => Some(d),
            None => {
                diag.unparseable_value += 1;
                warn!(value = raw, "unparseable reference date, treating as absent");
                None
            }
        }
    }

    fn minutes(
        &self,
        row: &StringRecord,
        idx: Option<usize>,
        diag: &mut RunDiagnostics,
    ) -> Option<i64> {
        let raw = self.cell(row, idx)?;
        match util::parse_minutes(raw) {
            Some(v) => Some(util::trunc_minutes(v)),
            None => {
                diag.unparseable_value += 1;
                warn!(value = raw, "unparseable duration, treating as absent");
                None
            }
        }
    }

    /// First login. The upstream export writes `0` when no login happened;
    /// that is "absent", not bad data.
    fn login(&self, row: &StringRecord, diag: &mut RunDiagnostics) -> Option<NaiveDateTime> {
        let raw = self.cell(row, self.primeiro_login)?;
        if raw == "0" {
            return None;
        }
        match util::parse_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                diag.unparseable_value += 1;
                warn!(value = raw, "unparseable login timestamp, treating as absent");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ColumnSettings;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const BASE: &[&str] = &[
        "Equipe",
        "Despachada",
        "A_Caminho",
        "No_Local",
        "Liberada",
        "Inicio Calendario",
        "Fim Calendario",
    ];

    #[test]
    fn resolves_required_columns() {
        let map = ColumnMap::resolve(&headers(BASE), &ColumnSettings::default()).unwrap();
        assert!(map.inicio_intervalo.is_none());
        assert!(map.primeiro_login.is_none());
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let mut h = headers(BASE);
        h.retain(|c| c != "Liberada");
        let err = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap_err();
        match err {
            PipelineError::MissingColumn { logical, .. } => assert_eq!(logical, "Liberada"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accented_candidates_resolve_in_order() {
        let mut h = headers(BASE);
        h.push("Início_Intervalo".to_string());
        h.push("Fim Intervalo".to_string());
        let map = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap();
        assert_eq!(map.inicio_intervalo, Some(7));
        assert_eq!(map.fim_intervalo, Some(8));
    }

    #[test]
    fn unparseable_cells_count_and_null() {
        let h = headers(BASE);
        let map = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap();
        let row = StringRecord::from(vec![
            "T01",
            "banana",
            "01/03/2024 08:15",
            "",
            "01/03/2024 09:05",
            "01/03/2024 08:00",
            "01/03/2024 16:00",
        ]);
        let mut diag = RunDiagnostics::default();
        let rec = map.resolve_record(&row, 1, &mut diag);
        assert_eq!(rec.despachada, None);
        assert_eq!(diag.unparseable_value, 1);
        assert!(rec.no_local.is_none());
        assert!(rec.a_caminho.is_some());
        // With dispatch unusable and no reference date, the day is unknown.
        assert_eq!(rec.data, None);
    }

    #[test]
    fn login_zero_is_absent_not_unparseable() {
        let mut h = headers(BASE);
        h.push("1º Login".to_string());
        let map = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap();
        let row = StringRecord::from(vec![
            "T01",
            "01/03/2024 08:10",
            "01/03/2024 08:15",
            "01/03/2024 08:25",
            "01/03/2024 09:05",
            "01/03/2024 08:00",
            "01/03/2024 16:00",
            "0",
        ]);
        let mut diag = RunDiagnostics::default();
        let rec = map.resolve_record(&row, 1, &mut diag);
        assert_eq!(rec.primeiro_login, None);
        assert_eq!(diag.unparseable_value, 0);
    }

    #[test]
    fn login_falls_back_through_candidates() {
        let mut h = headers(BASE);
        h.push("Log In".to_string());
        let map = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap();
        let row = StringRecord::from(vec![
            "T01",
            "01/03/2024 08:10",
            "01/03/2024 08:15",
            "01/03/2024 08:25",
            "01/03/2024 09:05",
            "01/03/2024 08:00",
            "01/03/2024 16:00",
            "01/03/2024 08:05",
        ]);
        let mut diag = RunDiagnostics::default();
        let rec = map.resolve_record(&row, 1, &mut diag);
        assert!(rec.primeiro_login.is_some());
    }

    #[test]
    fn duration_cells_truncate_comma_decimals() {
        let mut h = headers(BASE);
        h.push("Retorno a base".to_string());
        let map = ColumnMap::resolve(&h, &ColumnSettings::default()).unwrap();
        let row = StringRecord::from(vec![
            "T01",
            "01/03/2024 08:10",
            "01/03/2024 08:15",
            "01/03/2024 08:25",
            "01/03/2024 09:05",
            "01/03/2024 08:00",
            "01/03/2024 16:00",
            "20,7",
        ]);
        let mut diag = RunDiagnostics::default();
        let rec = map.resolve_record(&row, 1, &mut diag);
        assert_eq!(rec.retorno_base, Some(20));
    }
}
