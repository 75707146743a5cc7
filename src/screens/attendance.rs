//! Daily attendance for one course section.
//!
//! The screen holds a roster for the chosen (curso, division, fecha). Loading reads
//! the active students and whatever was already recorded for that date; students
//! with nothing recorded show as present. Saving writes one row per student in a
//! single upsert keyed on (alumno_id, fecha), so saving twice never duplicates.

use super::{active_roster, today, RosterStudent, ScreenError, ScreenResult};
use crate::backend::{Backend, Row, Select};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Presente,
    Ausente,
    Tarde,
    Justificada,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Presente => "PRESENTE",
            AttendanceStatus::Ausente => "AUSENTE",
            AttendanceStatus::Tarde => "TARDE",
            AttendanceStatus::Justificada => "JUSTIFICADA",
        }
    }
}

/// A stored status for one student on the selected date.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    pub alumno_id: String,
    pub estado: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub curso: String,
    pub division: String,
    pub fecha: String,
}

impl Selection {
    fn is_complete(&self) -> bool {
        !self.curso.trim().is_empty()
            && !self.division.trim().is_empty()
            && !self.fecha.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Saving,
    Saved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub student: RosterStudent,
    pub estado: AttendanceStatus,
    /// Whether `estado` comes from a stored record rather than the default.
    pub recorded: bool,
}

#[derive(Debug, Serialize)]
pub struct AttendanceView<'a> {
    pub selection: &'a Selection,
    pub phase: Phase,
    pub saved: bool,
    pub roster: &'a [RosterEntry],
    #[serde(rename = "lastError")]
    pub last_error: Option<&'a str>,
}

/// Pairs each student with its stored status for the date, defaulting to present.
pub fn merge_roster(
    students: Vec<RosterStudent>,
    records: &[AttendanceRecord],
) -> Vec<RosterEntry> {
    let stored: HashMap<&str, AttendanceStatus> = records
        .iter()
        .map(|r| (r.alumno_id.as_str(), r.estado))
        .collect();
    students
        .into_iter()
        .map(|student| {
            let found = stored.get(student.id.as_str()).copied();
            RosterEntry {
                estado: found.unwrap_or(AttendanceStatus::Presente),
                recorded: found.is_some(),
                student,
            }
        })
        .collect()
}

pub struct AttendanceScreen {
    selection: Selection,
    phase: Phase,
    roster: Vec<RosterEntry>,
    last_error: Option<String>,
}

impl Default for AttendanceScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceScreen {
    /// Starts idle with today's date preselected.
    pub fn new() -> Self {
        Self {
            selection: Selection {
                fecha: today(),
                ..Selection::default()
            },
            phase: Phase::Idle,
            roster: Vec::new(),
            last_error: None,
        }
    }

    pub fn view(&self) -> AttendanceView<'_> {
        AttendanceView {
            selection: &self.selection,
            phase: self.phase,
            saved: self.phase == Phase::Saved,
            roster: &self.roster,
            last_error: self.last_error.as_deref(),
        }
    }

    /// Applies a new filter selection. Any change discards unsaved toggles and
    /// reloads; an incomplete selection empties the roster.
    pub fn select(&mut self, backend: &Backend, selection: Selection) -> ScreenResult<()> {
        let fecha = selection.fecha.trim();
        if !fecha.is_empty() && NaiveDate::parse_from_str(fecha, "%Y-%m-%d").is_err() {
            return Err(ScreenError::field("fecha", "Fecha inválida"));
        }
        if selection == self.selection && self.phase != Phase::Idle {
            return Ok(());
        }
        self.selection = selection;
        self.roster.clear();
        self.last_error = None;
        if !self.selection.is_complete() {
            self.phase = Phase::Idle;
            return Ok(());
        }
        self.load(backend)
    }

    /// Re-reads the roster for the current selection.
    pub fn reload(&mut self, backend: &Backend) -> ScreenResult<()> {
        if !self.selection.is_complete() {
            self.phase = Phase::Idle;
            self.roster.clear();
            return Ok(());
        }
        self.load(backend)
    }

    fn load(&mut self, backend: &Backend) -> ScreenResult<()> {
        self.phase = Phase::Loading;
        match fetch_roster(backend, &self.selection) {
            Ok(roster) => {
                log::debug!(
                    "attendance roster {} {} {}: {} students",
                    self.selection.curso,
                    self.selection.division,
                    self.selection.fecha,
                    roster.len()
                );
                self.roster = roster;
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(e) => {
                self.roster.clear();
                self.phase = Phase::Idle;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_status(&mut self, alumno_id: &str, estado: AttendanceStatus) -> ScreenResult<()> {
        if !matches!(self.phase, Phase::Ready | Phase::Saved) {
            return Err(ScreenError::Rejected(
                "Seleccioná un curso y división para cargar la lista.".to_string(),
            ));
        }
        let Some(entry) = self.roster.iter_mut().find(|e| e.student.id == alumno_id) else {
            return Err(ScreenError::NotFound {
                what: "student in roster",
                redirect: "/asistencias",
            });
        };
        entry.estado = estado;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Writes every roster entry, defaults included. Returns the rows written.
    pub fn save(&mut self, backend: &Backend) -> ScreenResult<usize> {
        if !matches!(self.phase, Phase::Ready | Phase::Saved) || self.roster.is_empty() {
            return Err(ScreenError::Rejected(
                "No hay alumnos para guardar".to_string(),
            ));
        }
        self.phase = Phase::Saving;
        let rows: Vec<Row> = self
            .roster
            .iter()
            .filter_map(|e| {
                json!({
                    "alumno_id": e.student.id,
                    "fecha": self.selection.fecha,
                    "estado": e.estado.as_str(),
                })
                .as_object()
                .cloned()
            })
            .collect();
        match backend.upsert("asistencias", rows, &["alumno_id", "fecha"]) {
            Ok(written) => {
                for e in &mut self.roster {
                    e.recorded = true;
                }
                self.phase = Phase::Saved;
                self.last_error = None;
                log::info!(
                    "saved attendance for {} {} on {} ({written} rows)",
                    self.selection.curso,
                    self.selection.division,
                    self.selection.fecha
                );
                Ok(written)
            }
            Err(e) => {
                let err = ScreenError::update(e);
                self.phase = Phase::Ready;
                self.last_error = Some("Error al guardar asistencias".to_string());
                Err(err)
            }
        }
    }
}

fn fetch_roster(backend: &Backend, selection: &Selection) -> ScreenResult<Vec<RosterEntry>> {
    let students = active_roster(backend, &selection.curso, &selection.division)?;
    let ids: Vec<String> = students.iter().map(|s| s.id.clone()).collect();
    let query = Select::from("asistencias")
        .columns(&["alumno_id", "estado"])
        .eq("fecha", selection.fecha.as_str())
        .in_list("alumno_id", ids);
    let records: Vec<AttendanceRecord> = backend.select_as(&query).map_err(ScreenError::query)?;
    Ok(merge_roster(students, &records))
}
