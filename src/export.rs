use crate::calc;
use crate::records::Snapshot;
use crate::setup::PrintSetup;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const HEADER: [&str; 6] = ["ID", "Nama", "Kelas", "Tanggal", "Absensi", "Nilai"];
pub const ATTENDANCE_SHEET_HEADER: [&str; 5] =
    ["Tanggal", "Kelas", "ID Siswa", "Nama Siswa", "Status"];
pub const GRADE_LEDGER_HEADER: [&str; 5] = ["Tanggal", "Kelas", "ID Siswa", "Nama Siswa", "Nilai"];

/// One (student, date) line of the joined student/attendance/grade view.
/// Students without any records get a single row with empty date fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    pub date: String,
    pub attendance: String,
    /// Mean of every grade entry recorded on exactly `date`.
    pub score: Option<f64>,
}

impl ExportRow {
    pub fn fields(&self) -> [String; 6] {
        [
            self.student_id.clone(),
            self.student_name.clone(),
            self.class_name.clone(),
            self.date.clone(),
            self.attendance.clone(),
            format_score(self.score),
        ]
    }
}

/// Two decimals with ties rounded away from zero, so 82.125 reads "82.13".
pub fn two_decimals(v: f64) -> String {
    format!("{:.2}", (v * 100.0).round() / 100.0)
}

pub fn format_score(score: Option<f64>) -> String {
    score.map(two_decimals).unwrap_or_default()
}

pub fn project_rows(
    snapshot: &Snapshot,
    class_filter: Option<&str>,
    unassigned: &str,
) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for r in snapshot.roster(class_filter, unassigned) {
        let mut by_date: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for g in snapshot.records.grades_for(&r.student_id) {
            by_date.entry(g.date.as_str()).or_default().push(g.score);
        }
        let mut dates: BTreeSet<&str> = by_date.keys().copied().collect();
        for (date, day) in &snapshot.records.attendance {
            if day.contains_key(&r.student_id) {
                dates.insert(date.as_str());
            }
        }

        if dates.is_empty() {
            rows.push(ExportRow {
                student_id: r.student_id,
                student_name: r.name,
                class_name: r.class_name,
                date: String::new(),
                attendance: String::new(),
                score: None,
            });
            continue;
        }
        for d in dates {
            rows.push(ExportRow {
                student_id: r.student_id.clone(),
                student_name: r.name.clone(),
                class_name: r.class_name.clone(),
                date: d.to_string(),
                attendance: snapshot
                    .records
                    .status_on(d, &r.student_id)
                    .map(|s| s.code().to_string())
                    .unwrap_or_default(),
                score: by_date.get(d).and_then(|scores| calc::mean(scores)),
            });
        }
    }
    rows
}

/// Always quotes; embedded quotes are doubled.
pub fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(&HEADER));
    for r in rows {
        lines.push(csv_line(&r.fields()));
    }
    lines.join("\n")
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn html_table(rows: &[ExportRow]) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for h in HEADER {
        html.push_str(&format!("<th>{}</th>", h));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for r in rows {
        html.push_str("<tr>");
        for f in r.fields() {
            html.push_str(&format!("<td>{}</td>", html_escape(&f)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// HTML table document that spreadsheet applications open directly as `.xls`.
pub fn to_spreadsheet(rows: &[ExportRow]) -> String {
    format!(
        "<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n{}\n</body>\n</html>\n",
        html_table(rows)
    )
}

/// Standalone printable document over the same rows as the CSV export.
pub fn to_print(rows: &[ExportRow], print: &PrintSetup, generated_on: &str) -> String {
    let mut body = String::new();
    if !print.school_name.is_empty() {
        body.push_str(&format!(
            "<p class=\"school\">{}</p>\n",
            html_escape(&print.school_name)
        ));
    }
    body.push_str(&format!("<h2>{}</h2>\n", html_escape(&print.title)));
    if print.show_generated_at {
        body.push_str(&format!(
            "<p class=\"meta\">Dicetak: {}</p>\n",
            html_escape(generated_on)
        ));
    }
    body.push_str(&html_table(rows));
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n\
         body {{ font-family: sans-serif; font-size: 11pt; }}\n\
         table {{ width: 100%; border-collapse: collapse; }}\n\
         th, td {{ border: 1px solid #444; padding: 2px 6px; text-align: left; }}\n\
         @media print {{ thead {{ display: table-header-group; }} }}\n\
         </style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape(&print.title),
        body
    )
}

/// Attendance marks for one date. Students without a mark get an empty status.
pub fn attendance_sheet_csv(
    snapshot: &Snapshot,
    date: &str,
    class_filter: Option<&str>,
    unassigned: &str,
) -> (String, usize) {
    let roster = snapshot.roster(class_filter, unassigned);
    let mut lines = Vec::with_capacity(roster.len() + 1);
    lines.push(csv_line(&ATTENDANCE_SHEET_HEADER));
    for r in &roster {
        let status = snapshot
            .records
            .status_on(date, &r.student_id)
            .map(|s| s.code())
            .unwrap_or("");
        lines.push(csv_line(&[
            date,
            r.class_name.as_str(),
            r.student_id.as_str(),
            r.name.as_str(),
            status,
        ]));
    }
    (lines.join("\n"), roster.len())
}

/// Every raw grade entry, in roster order then insertion order. With a class
/// filter only entries recorded under that class are listed.
pub fn grade_ledger_csv(snapshot: &Snapshot, class_filter: Option<&str>) -> (String, usize) {
    let mut lines = vec![csv_line(&GRADE_LEDGER_HEADER)];
    let mut count = 0usize;
    for r in snapshot.roster(None, "") {
        for g in snapshot.records.grades_for(&r.student_id) {
            if class_filter.map(|c| g.class_id != c).unwrap_or(false) {
                continue;
            }
            let class_name = snapshot
                .class(&g.class_id)
                .map(|c| c.name.as_str())
                .unwrap_or("");
            let score = g.score.to_string();
            lines.push(csv_line(&[
                g.date.as_str(),
                class_name,
                r.student_id.as_str(),
                r.name.as_str(),
                score.as_str(),
            ]));
            count += 1;
        }
    }
    (lines.join("\n"), count)
}

/// `<prefix>_<date>_<classId|all>.<ext>`
pub fn export_filename(prefix: &str, date: &str, class_id: Option<&str>, ext: &str) -> String {
    format!("{}_{}_{}.{}", prefix, date, class_id.unwrap_or("all"), ext)
}
