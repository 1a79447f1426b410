use crate::buckets;
use crate::model::{AttendanceStatus, Records};
use crate::records::Snapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Running sum for one bucket. A bucket only exists once it holds a score, so
/// the mean never divides by zero.
#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    sum: f64,
    count: usize,
}

impl Accum {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn mean(self) -> f64 {
        self.sum / (self.count as f64)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut acc = Accum::default();
    for v in values {
        acc.push(*v);
    }
    Some(acc.mean())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentAverages {
    pub monthly: BTreeMap<String, f64>,
    pub semester: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAggregate {
    pub students: BTreeMap<String, StudentAverages>,
    /// Entries whose stored date could not be bucketed.
    pub skipped_entries: usize,
}

impl GradeAggregate {
    pub fn monthly_average(&self, student_id: &str, month: &str) -> Option<f64> {
        self.students.get(student_id)?.monthly.get(month).copied()
    }

    pub fn semester_average(&self, student_id: &str, semester: &str) -> Option<f64> {
        self.students.get(student_id)?.semester.get(semester).copied()
    }
}

/// Per-student monthly and semester averages, recomputed from the raw entries
/// on every call. With `class_filter`, only entries recorded under that class
/// contribute.
pub fn aggregate(records: &Records, class_filter: Option<&str>) -> GradeAggregate {
    let mut monthly: BTreeMap<(&str, String), Accum> = BTreeMap::new();
    let mut semester: BTreeMap<(&str, String), Accum> = BTreeMap::new();
    let mut skipped_entries = 0usize;

    for (student_id, entries) in &records.grades {
        for g in entries {
            if let Some(c) = class_filter {
                if g.class_id != c {
                    continue;
                }
            }
            let Ok(d) = buckets::parse_date(&g.date) else {
                skipped_entries += 1;
                continue;
            };
            monthly
                .entry((student_id.as_str(), buckets::month_key_of(d)))
                .or_default()
                .push(g.score);
            semester
                .entry((student_id.as_str(), buckets::semester_key_of(d)))
                .or_default()
                .push(g.score);
        }
    }

    let mut students: BTreeMap<String, StudentAverages> = BTreeMap::new();
    for ((sid, key), acc) in monthly {
        students
            .entry(sid.to_string())
            .or_default()
            .monthly
            .insert(key, acc.mean());
    }
    for ((sid, key), acc) in semester {
        students
            .entry(sid.to_string())
            .or_default()
            .semester
            .insert(key, acc.mean());
    }

    GradeAggregate {
        students,
        skipped_entries,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceTally {
    pub present: usize,
    pub permitted: usize,
    pub sick: usize,
    pub absent: usize,
}

impl AttendanceTally {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Permitted => self.permitted += 1,
            AttendanceStatus::Sick => self.sick += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.permitted + self.sick + self.absent
    }
}

/// Status counts per student for one `YYYY-MM` bucket.
pub fn attendance_tally(records: &Records, month: &str) -> BTreeMap<String, AttendanceTally> {
    let mut out: BTreeMap<String, AttendanceTally> = BTreeMap::new();
    for (date, day) in &records.attendance {
        if buckets::month_key(date).ok().as_deref() != Some(month) {
            continue;
        }
        for (sid, status) in day {
            out.entry(sid.clone()).or_default().add(*status);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub students: usize,
    pub classes: usize,
    pub attendance_this_month: usize,
    pub grades_this_month: usize,
}

pub fn dashboard_stats(snapshot: &Snapshot, today: NaiveDate) -> DashboardStats {
    let month = buckets::month_key_of(today);
    let attendance_this_month = attendance_tally(&snapshot.records, &month)
        .values()
        .map(AttendanceTally::total)
        .sum();
    let grades_this_month = snapshot
        .records
        .grades
        .values()
        .flatten()
        .filter(|g| buckets::month_key(&g.date).ok().as_deref() == Some(month.as_str()))
        .count();
    DashboardStats {
        students: snapshot.students.len(),
        classes: snapshot.classes.len(),
        attendance_this_month,
        grades_this_month,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapRow {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub attendance: String,
    pub monthly_average: Option<f64>,
    pub semester_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recap {
    pub date: String,
    pub month: String,
    pub semester: String,
    pub rows: Vec<RecapRow>,
}

/// One row per student for the selected date: that day's attendance plus the
/// averages of the month and semester containing it.
pub fn recap(
    snapshot: &Snapshot,
    date: NaiveDate,
    class_filter: Option<&str>,
    unassigned: &str,
) -> Recap {
    let agg = aggregate(&snapshot.records, None);
    let date_str = date.format("%Y-%m-%d").to_string();
    let month = buckets::month_key_of(date);
    let semester = buckets::semester_key_of(date);
    let rows = snapshot
        .roster(class_filter, unassigned)
        .into_iter()
        .map(|r| RecapRow {
            attendance: snapshot
                .records
                .status_on(&date_str, &r.student_id)
                .map(|s| s.code().to_string())
                .unwrap_or_default(),
            monthly_average: agg.monthly_average(&r.student_id, &month),
            semester_average: agg.semester_average(&r.student_id, &semester),
            student_id: r.student_id,
            name: r.name,
            class_name: r.class_name,
        })
        .collect();
    Recap {
        date: date_str,
        month,
        semester,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradeEntry;

    fn entry(date: &str, score: f64) -> GradeEntry {
        GradeEntry {
            date: date.to_string(),
            score,
            class_id: "c1".to_string(),
        }
    }

    fn records_with(grades: Vec<(&str, Vec<GradeEntry>)>) -> Records {
        let mut r = Records::default();
        for (sid, entries) in grades {
            r.grades.insert(sid.to_string(), entries);
        }
        r
    }

    #[test]
    fn monthly_average_has_no_empty_buckets() {
        let r = records_with(vec![(
            "a",
            vec![entry("2024-07-10", 80.0), entry("2024-07-20", 90.0)],
        )]);
        let agg = aggregate(&r, None);
        assert_eq!(agg.monthly_average("a", "2024-07"), Some(85.0));
        assert_eq!(format!("{:.2}", agg.monthly_average("a", "2024-07").unwrap()), "85.00");
        assert_eq!(agg.monthly_average("a", "2024-08"), None);
        assert!(!agg.students["a"].monthly.contains_key("2024-08"));
        assert_eq!(agg.semester_average("a", "2024-S1"), Some(85.0));
    }

    #[test]
    fn buckets_are_independent_per_student_and_semester() {
        let r = records_with(vec![
            (
                "a",
                vec![
                    entry("2024-06-30", 60.0),
                    entry("2024-07-01", 100.0),
                    entry("2024-12-31", 80.0),
                ],
            ),
            ("b", vec![entry("2024-07-05", 70.0)]),
        ]);
        let agg = aggregate(&r, None);
        assert_eq!(agg.semester_average("a", "2024-S2"), Some(60.0));
        assert_eq!(agg.semester_average("a", "2024-S1"), Some(90.0));
        assert_eq!(agg.monthly_average("b", "2024-07"), Some(70.0));
        assert_eq!(agg.students["a"].monthly.len(), 3);
    }

    #[test]
    fn students_without_entries_are_absent() {
        let mut r = records_with(vec![("a", vec![entry("2024-07-10", 80.0)])]);
        r.grades.insert("empty".into(), Vec::new());
        let agg = aggregate(&r, None);
        assert!(!agg.students.contains_key("empty"));
        assert!(aggregate(&Records::default(), None).students.is_empty());
    }

    #[test]
    fn class_filter_uses_entry_class() {
        let mut other = entry("2024-07-11", 10.0);
        other.class_id = "c2".into();
        let r = records_with(vec![("a", vec![entry("2024-07-10", 80.0), other])]);
        assert_eq!(aggregate(&r, Some("c1")).monthly_average("a", "2024-07"), Some(80.0));
        assert_eq!(aggregate(&r, Some("c2")).monthly_average("a", "2024-07"), Some(10.0));
        assert!(aggregate(&r, Some("c3")).students.is_empty());
    }

    #[test]
    fn unparseable_stored_dates_are_counted_not_bucketed() {
        let r = records_with(vec![(
            "a",
            vec![entry("2024-07-10", 80.0), entry("bogus", 0.0)],
        )]);
        let agg = aggregate(&r, None);
        assert_eq!(agg.skipped_entries, 1);
        assert_eq!(agg.monthly_average("a", "2024-07"), Some(80.0));
        assert_eq!(agg.students["a"].monthly.len(), 1);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let r = records_with(vec![
            ("a", vec![entry("2024-07-10", 81.3), entry("2024-09-02", 77.7)]),
            ("b", vec![entry("2025-01-15", 92.0)]),
        ]);
        let first = serde_json::to_string(&aggregate(&r, None)).unwrap();
        let second = serde_json::to_string(&aggregate(&r, None)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tally_and_dashboard_count_current_month() {
        let s = Snapshot::default();
        let (s, c) = s.create_class("VII A").unwrap();
        let (s, ani) = s.create_student("Ani", Some(&c.id)).unwrap();
        let s = s
            .record_attendance("2024-07-10", &ani.id, AttendanceStatus::Present)
            .unwrap()
            .record_attendance("2024-07-11", &ani.id, AttendanceStatus::Sick)
            .unwrap()
            .record_attendance("2024-08-01", &ani.id, AttendanceStatus::Absent)
            .unwrap();
        let (s, _) = s.record_grade("2024-07-10", &ani.id, 80.0).unwrap();

        let tally = attendance_tally(&s.records, "2024-07");
        assert_eq!(tally[&ani.id].present, 1);
        assert_eq!(tally[&ani.id].sick, 1);
        assert_eq!(tally[&ani.id].absent, 0);

        let today = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        let stats = dashboard_stats(&s, today);
        assert_eq!(
            stats,
            DashboardStats {
                students: 1,
                classes: 1,
                attendance_this_month: 2,
                grades_this_month: 1
            }
        );
    }

    #[test]
    fn recap_reports_averages_for_the_selected_date() {
        let s = Snapshot::default();
        let (s, c) = s.create_class("VII A").unwrap();
        let (s, ani) = s.create_student("Ani", Some(&c.id)).unwrap();
        let (s, budi) = s.create_student("Budi", None).unwrap();
        let s = s
            .record_attendance("2024-07-20", &ani.id, AttendanceStatus::Permitted)
            .unwrap();
        let (s, _) = s.record_grade("2024-07-10", &ani.id, 80.0).unwrap();
        let (s, _) = s.record_grade("2024-09-10", &ani.id, 60.0).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
        let recap = recap(&s, day, None, "-");
        assert_eq!(recap.month, "2024-07");
        assert_eq!(recap.semester, "2024-S1");
        assert_eq!(recap.rows.len(), 2);
        let a = recap.rows.iter().find(|r| r.student_id == ani.id).unwrap();
        assert_eq!(a.attendance, "I");
        assert_eq!(a.monthly_average, Some(80.0));
        assert_eq!(a.semester_average, Some(70.0));
        let b = recap.rows.iter().find(|r| r.student_id == budi.id).unwrap();
        assert_eq!(b.class_name, "-");
        assert_eq!(b.monthly_average, None);
    }
}
