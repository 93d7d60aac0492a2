// Application settings: file names, column candidate lists, and goal values.
//
// Everything has a sensible default; a TOML file can override any section.
// Goal values are display-only, they never feed the metric calculations.
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub input_file: String,
    pub output_dir: PathBuf,
    pub output_calculated: String,
    pub output_productive: String,
    pub output_unproductive: String,
    pub output_summary: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            input_file: "deslocamento.csv".to_string(),
            output_dir: PathBuf::from("result"),
            output_calculated: "deslocamento_calculado.csv".to_string(),
            output_productive: "medias_por_equipe_dia.csv".to_string(),
            output_unproductive: "medias_Improdutivas_por_equipe_dia.csv".to_string(),
            output_summary: "resumo.json".to_string(),
        }
    }
}

/// Ordered candidate column names per logical field.
///
/// Exports vary in accents and underscores; the first candidate present in
/// the header row wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub equipe: Vec<String>,
    pub data_referencia: Vec<String>,
    pub despachada: Vec<String>,
    pub a_caminho: Vec<String>,
    pub no_local: Vec<String>,
    pub liberada: Vec<String>,
    pub prev_liberada: Vec<String>,
    pub inicio_intervalo: Vec<String>,
    pub fim_intervalo: Vec<String>,
    pub inicio_calendario: Vec<String>,
    pub fim_calendario: Vec<String>,
    pub primeiro_login: Vec<String>,
    pub retorno_base: Vec<String>,
    pub horas_extras: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            equipe: names(&["Equipe"]),
            data_referencia: names(&["Data Referência", "Data Referencia", "Data_Referencia"]),
            despachada: names(&["Despachada"]),
            a_caminho: names(&["A_Caminho", "A Caminho"]),
            no_local: names(&["No_Local", "No Local"]),
            liberada: names(&["Liberada"]),
            prev_liberada: names(&["PrevLiberada", "Prev_Liberada"]),
            inicio_intervalo: names(&[
                "Inicio Intervalo",
                "Início Intervalo",
                "Inicio_Intervalo",
                "Início_Intervalo",
            ]),
            fim_intervalo: names(&["Fim Intervalo", "Fim_Intervalo"]),
            inicio_calendario: names(&[
                "Inicio Calendario",
                "Início Calendario",
                "Inicio_Calendario",
                "Início_Calendario",
            ]),
            fim_calendario: names(&[
                "Fim Calendario",
                "Fim_Calendario",
                "FimCalendario",
            ]),
            primeiro_login: names(&[
                "1º Login",
                "1º LogIn",
                "1º Login Corrigido",
                "Log In",
                "Login",
            ]),
            retorno_base: names(&["Retorno a base", "Retorno_a_base", "Retorno Base"]),
            horas_extras: names(&["Horas Extras", "Horas_Extras", "Hora Extra"]),
        }
    }
}

/// Goal values used for display and goal comparison in the run summary.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MetricTargets {
    /// Target execution time for productive orders, minutes.
    pub temp_exe_productive: f64,
    /// Target execution time for unproductive orders, minutes.
    pub temp_exe_unproductive: f64,
    /// Regulatory break length, minutes.
    pub intervalo_regulamentar: f64,
    /// Standard journey length, minutes (7h48).
    pub jornada_total: f64,
    /// Target share of the journey spent on orders.
    pub utilizacao_meta: f64,
}

impl Default for MetricTargets {
    fn default() -> Self {
        Self {
            temp_exe_productive: 50.0,
            temp_exe_unproductive: 20.0,
            intervalo_regulamentar: 60.0,
            jornada_total: 468.0,
            utilizacao_meta: 0.85,
        }
    }
}

impl MetricTargets {
    pub fn tempo_util_meta(&self) -> f64 {
        self.jornada_total * self.utilizacao_meta
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub files: FileSettings,
    pub columns: ColumnSettings,
    pub metrics: MetricTargets,
}

impl Settings {
    /// Load settings from a TOML file; unspecified sections keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| PipelineError::Settings {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_journey() {
        let s = Settings::default();
        assert_eq!(s.metrics.jornada_total, 468.0);
        assert_eq!(s.metrics.tempo_util_meta(), 468.0 * 0.85);
        assert_eq!(s.files.input_file, "deslocamento.csv");
    }

    #[test]
    fn toml_overrides_keep_other_sections() {
        let parsed: Settings = toml::from_str(
            r#"
            [metrics]
            jornada_total = 480.0

            [columns]
            equipe = ["Team"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.metrics.jornada_total, 480.0);
        // Untouched fields keep their defaults.
        assert_eq!(parsed.metrics.temp_exe_productive, 50.0);
        assert_eq!(parsed.columns.equipe, vec!["Team".to_string()]);
        assert_eq!(parsed.columns.despachada, vec!["Despachada".to_string()]);
    }
}
